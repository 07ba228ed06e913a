//! Authentication extractors.
//!
//! Provides extractors for requiring a signed-in user in route handlers.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::middleware::context::push_flash;
use crate::models::{CurrentUser, FlashLevel, FlashMessage, session_keys};

/// Notice shown when an account page is opened while signed out.
pub const LOGIN_REQUIRED_PAGE: &str = "You Must Be Logged In To Access This Page";

/// Notice shown when a member-only action is attempted while signed out.
pub const LOGIN_REQUIRED_FEATURE: &str = "You Must Be Logged In To Use This Feature";

/// Extractor that requires a signed-in user.
///
/// If nobody is signed in, the request is redirected to the home page with a
/// flash notice. Wishlist routes get the "feature" wording, everything else
/// the "page" wording.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Rejection returned when a signed-in user is required.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect home; the notice is already queued.
    RedirectHome,
    /// The session layer is not installed.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectHome => Redirect::to("/").into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// Pick the login-required notice for a request path.
#[must_use]
pub fn login_required_notice(path: &str) -> &'static str {
    if path.starts_with("/wishlist") {
        LOGIN_REQUIRED_FEATURE
    } else {
        LOGIN_REQUIRED_PAGE
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::MissingSession)?;

        if let Some(user) = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
        {
            return Ok(Self(user));
        }

        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path().to_owned(), |uri| uri.path().to_owned());

        let notice = FlashMessage {
            level: FlashLevel::Error,
            text: login_required_notice(&path).to_string(),
        };
        if let Err(e) = push_flash(session, notice).await {
            tracing::warn!("Failed to queue login notice: {e}");
        }

        Err(AuthRejection::RedirectHome)
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is signed in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Store the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_required_notice_by_path() {
        assert_eq!(login_required_notice("/wishlist"), LOGIN_REQUIRED_FEATURE);
        assert_eq!(
            login_required_notice("/wishlist/add/3"),
            LOGIN_REQUIRED_FEATURE
        );
        assert_eq!(login_required_notice("/update-user"), LOGIN_REQUIRED_PAGE);
        assert_eq!(login_required_notice("/update-info"), LOGIN_REQUIRED_PAGE);
    }
}
