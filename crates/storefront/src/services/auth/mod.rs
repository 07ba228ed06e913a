//! Authentication service.
//!
//! Username and password authentication with Argon2id hashes.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use emporium_core::{UserId, Username};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::{AccountDetails, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
///
/// Handles registration, login, and password changes.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user.
    ///
    /// Creates the user, the password hash, and an empty profile in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordMismatch` or `AuthError::WeakPassword` if the
    /// passwords are unacceptable.
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    pub async fn register(
        &self,
        details: &AccountDetails,
        password1: &str,
        password2: &str,
    ) -> Result<User, AuthError> {
        validate_new_password(password1, password2)?;

        let password_hash = hash_password(password1)?;

        let user = self
            .users
            .create_with_password(details, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username or password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Replace a user's password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordMismatch` or `AuthError::WeakPassword` if the
    /// new password is unacceptable.
    pub async fn change_password(
        &self,
        user_id: UserId,
        password1: &str,
        password2: &str,
    ) -> Result<(), AuthError> {
        validate_new_password(password1, password2)?;
        let password_hash = hash_password(password1)?;
        self.users.set_password_hash(user_id, &password_hash).await?;
        Ok(())
    }
}

// =============================================================================
// Password Helpers
// =============================================================================

/// Every problem with a proposed password pair, in display order.
#[must_use]
pub fn password_problems(password1: &str, password2: &str) -> Vec<AuthError> {
    let mut problems = Vec::new();

    if password1 != password2 {
        problems.push(AuthError::PasswordMismatch);
    }
    if password1.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(AuthError::WeakPassword(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }
    if !password1.is_empty() && password1.chars().all(|c| c.is_ascii_digit()) {
        problems.push(AuthError::WeakPassword(
            "This password is entirely numeric.".to_string(),
        ));
    }

    problems
}

/// Validate a new password and its confirmation.
///
/// # Errors
///
/// Returns the first problem found by [`password_problems`].
pub fn validate_new_password(password1: &str, password2: &str) -> Result<(), AuthError> {
    match password_problems(password1, password2).into_iter().next() {
        Some(problem) => Err(problem),
        None => Ok(()),
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
