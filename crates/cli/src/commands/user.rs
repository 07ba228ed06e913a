//! Shopper account commands.
//!
//! # Usage
//!
//! ```bash
//! EMPORIUM_NEW_USER_PASSWORD='correct horse' emp-cli user create -u jane -e jane@example.com
//! ```
//!
//! The password is taken from the environment so it never appears in shell
//! history or the process list.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use emporium_core::{Email, Username};
use emporium_storefront::models::AccountDetails;
use emporium_storefront::services::auth::{AuthError, AuthService};

use super::{CommandError, connect};

/// Environment variable holding the new user's password.
const PASSWORD_ENV: &str = "EMPORIUM_NEW_USER_PASSWORD";

/// Errors that can occur while creating a user.
#[derive(Debug, Error)]
pub enum UserError {
    /// Connection setup failed.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Invalid username.
    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] emporium_core::UsernameError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] emporium_core::EmailError),

    /// Registration was rejected.
    #[error("Could not create user: {0}")]
    Auth(#[from] AuthError),
}

/// Create a new user with an empty profile.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error if the password variable is unset, a field is invalid,
/// the username is taken, or the database fails.
pub async fn create(
    username: &str,
    email: &str,
    first_name: &str,
    last_name: &str,
) -> Result<i32, UserError> {
    let details = AccountDetails {
        username: Username::parse(username)?,
        email: Email::parse(email)?,
        first_name: first_name.trim().to_string(),
        last_name: last_name.trim().to_string(),
    };

    let password = std::env::var(PASSWORD_ENV)
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar(PASSWORD_ENV))?;

    let pool = connect().await?;

    tracing::info!("Creating user: {} ({})", details.username, details.email);
    let user = AuthService::new(&pool)
        .register(
            &details,
            password.expose_secret(),
            password.expose_secret(),
        )
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Username: {}",
        user.id,
        user.username
    );

    Ok(user.id.as_i32())
}
