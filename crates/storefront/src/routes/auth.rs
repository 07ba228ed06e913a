//! Authentication route handlers.
//!
//! Handles login, logout, and registration with username and password.
//! A successful login folds the shopper's saved cart into the session cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use emporium_core::{Email, Username};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{PageContext, RequestContext};
use crate::models::{AccountDetails, CurrentUser, User};
use crate::services::auth::{AuthError, AuthService, password_problems};
use crate::services::cart::restore_saved_cart;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    /// Where to go after logging in, already checked by [`safe_next`].
    pub next: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
}

// =============================================================================
// Helpers
// =============================================================================

/// Accept a post-login destination only if it is a local path.
///
/// Rejects absolute URLs, scheme-relative `//host` paths, and backslash
/// tricks that some browsers treat as `//`.
#[must_use]
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.map(str::trim).filter(|n| {
        n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') && !n.contains("://")
    })
}

/// Sign a user in and restore their saved cart.
///
/// A failure to restore the cart is logged; the login itself still stands.
async fn complete_login(state: &AppState, ctx: &mut RequestContext, user: &User) -> Result<()> {
    ctx.log_in(CurrentUser {
        id: user.id,
        username: user.username.clone(),
    })
    .await?;

    let mut cart = ctx.cart().await?;
    if let Err(e) = restore_saved_cart(state.pool(), user.id, &mut cart).await {
        tracing::error!(user_id = %user.id, error = %e, "Failed to restore saved cart");
    }
    ctx.store_cart(&cart).await?;

    set_sentry_user(&user.id, Some(user.username.as_str()));
    Ok(())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip(ctx))]
pub async fn login_page(ctx: RequestContext, Query(query): Query<NextQuery>) -> Result<Response> {
    let next = safe_next(query.next.as_deref()).map(String::from);
    Ok(LoginTemplate {
        page: ctx.page().await?,
        next,
    }
    .into_response())
}

/// Handle login form submission.
#[instrument(skip(state, ctx, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    mut ctx: RequestContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = safe_next(form.next.as_deref());

    match AuthService::new(state.pool())
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            complete_login(&state, &mut ctx, &user).await?;
            tracing::info!(user_id = %user.id, "User logged in");
            ctx.success("You Have Been Logged In!").await?;
            Ok(Redirect::to(next.unwrap_or("/")).into_response())
        }
        Err(e) if e.is_user_error() => {
            tracing::info!("Login failed: {e}");
            ctx.error("There was an error, please try again...").await?;
            let target = next.map_or_else(
                || "/login".to_string(),
                |n| format!("/login?next={}", urlencoding::encode(n)),
            );
            Ok(Redirect::to(&target).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle logout. Clears the whole session, cart included.
#[instrument(skip(ctx))]
pub async fn logout(mut ctx: RequestContext) -> Result<Response> {
    ctx.log_out().await?;
    clear_sentry_user();
    ctx.success("You Have Been Logged Out...").await?;
    Ok(Redirect::to("/").into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(ctx))]
pub async fn register_page(ctx: RequestContext) -> Result<Response> {
    Ok(RegisterTemplate {
        page: ctx.page().await?,
    }
    .into_response())
}

/// Collect every problem with a registration form.
fn registration_problems(form: &RegisterForm) -> (Option<AccountDetails>, Vec<String>) {
    let mut problems = Vec::new();

    let username = Username::parse(&form.username)
        .map_err(|e| problems.push(AuthError::from(e).to_string()))
        .ok();
    let email = Email::parse(&form.email)
        .map_err(|e| problems.push(AuthError::from(e).to_string()))
        .ok();
    problems.extend(
        password_problems(&form.password1, &form.password2)
            .iter()
            .map(ToString::to_string),
    );

    let details = match (username, email) {
        (Some(username), Some(email)) if problems.is_empty() => Some(AccountDetails {
            username,
            email,
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
        }),
        _ => None,
    };
    (details, problems)
}

/// Handle registration form submission.
#[instrument(skip(state, ctx, form), fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    mut ctx: RequestContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let (details, mut problems) = registration_problems(&form);

    if let Some(details) = details {
        match AuthService::new(state.pool())
            .register(&details, &form.password1, &form.password2)
            .await
        {
            Ok(user) => {
                complete_login(&state, &mut ctx, &user).await?;
                tracing::info!(user_id = %user.id, "User registered");
                ctx.success("Username Created - Please Fill Out Your Billing Info Below...")
                    .await?;
                return Ok(Redirect::to("/update-info").into_response());
            }
            Err(e) if e.is_user_error() => problems.push(e.to_string()),
            Err(e) => return Err(AppError::from(e)),
        }
    }

    tracing::info!(problems = ?problems, "Registration rejected");
    ctx.error("There was a problem Registering, please try again")
        .await?;
    for problem in problems {
        ctx.error(problem).await?;
    }
    Ok(Redirect::to("/register").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, email: &str, p1: &str, p2: &str) -> RegisterForm {
        RegisterForm {
            username: username.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            password1: p1.to_string(),
            password2: p2.to_string(),
        }
    }

    #[test]
    fn test_safe_next_accepts_local_paths() {
        assert_eq!(safe_next(Some("/product/3")), Some("/product/3"));
        assert_eq!(safe_next(Some("/cart?x=1")), Some("/cart?x=1"));
    }

    #[test]
    fn test_safe_next_rejects_offsite_targets() {
        assert_eq!(safe_next(None), None);
        assert_eq!(safe_next(Some("")), None);
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("/\\evil.example")), None);
        assert_eq!(safe_next(Some("product/3")), None);
    }

    #[test]
    fn test_valid_registration_has_no_problems() {
        let (details, problems) = registration_problems(&form(
            "ada",
            "ada@example.com",
            "difference-engine",
            "difference-engine",
        ));
        assert!(problems.is_empty());
        let details = details.expect("details");
        assert_eq!(details.username.as_str(), "ada");
        assert_eq!(details.first_name, "Ada");
    }

    #[test]
    fn test_registration_reports_every_problem() {
        let (details, problems) =
            registration_problems(&form("bad name", "nope", "12345678", "87654321"));
        assert!(details.is_none());
        // username, email, mismatch, numeric
        assert!(problems.len() >= 4, "{problems:?}");
    }
}
