//! Request-scoped context: session, current user, and flash notices.
//!
//! Handlers take a [`RequestContext`] instead of reaching for globals. It is
//! built from the session the session layer attached to the request.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use emporium_core::{SessionCart, UserId};

use crate::error::AppError;
use crate::models::{CurrentUser, FlashLevel, FlashMessage, session_keys};

/// Per-request view of the shopper's session.
pub struct RequestContext {
    session: Session,
    user: Option<CurrentUser>,
}

/// Data every page layout needs.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
    pub cart_count: u32,
}

impl PageContext {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Append a notice to the session's flash queue.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn push_flash(
    session: &Session,
    message: FlashMessage,
) -> Result<(), tower_sessions::session::Error> {
    let mut queue: Vec<FlashMessage> = session
        .get(session_keys::FLASH)
        .await?
        .unwrap_or_default();
    queue.push(message);
    session.insert(session_keys::FLASH, queue).await
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await?;

        Ok(Self { session, user })
    }
}

impl RequestContext {
    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|u| u.id)
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    // =========================================================================
    // Flash notices
    // =========================================================================

    /// Queue a notice for the next rendered page.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session cannot be written.
    pub async fn flash(&self, level: FlashLevel, text: impl Into<String>) -> Result<(), AppError> {
        push_flash(
            &self.session,
            FlashMessage {
                level,
                text: text.into(),
            },
        )
        .await?;
        Ok(())
    }

    /// Queue a success notice.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session cannot be written.
    pub async fn success(&self, text: impl Into<String>) -> Result<(), AppError> {
        self.flash(FlashLevel::Success, text).await
    }

    /// Queue an error notice.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session cannot be written.
    pub async fn error(&self, text: impl Into<String>) -> Result<(), AppError> {
        self.flash(FlashLevel::Error, text).await
    }

    /// Remove and return all queued notices.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session cannot be read.
    pub async fn take_flashes(&self) -> Result<Vec<FlashMessage>, AppError> {
        Ok(self
            .session
            .remove::<Vec<FlashMessage>>(session_keys::FLASH)
            .await?
            .unwrap_or_default())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// The session cart; empty if none is stored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session cannot be read.
    pub async fn cart(&self) -> Result<SessionCart, AppError> {
        Ok(self
            .session
            .get::<SessionCart>(session_keys::CART)
            .await?
            .unwrap_or_default())
    }

    /// Replace the session cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session cannot be written.
    pub async fn store_cart(&self, cart: &SessionCart) -> Result<(), AppError> {
        self.session.insert(session_keys::CART, cart).await?;
        Ok(())
    }

    // =========================================================================
    // Login state
    // =========================================================================

    /// Record a successful login, rotating the session ID.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session cannot be written.
    pub async fn log_in(&mut self, user: CurrentUser) -> Result<(), AppError> {
        self.session.cycle_id().await?;
        super::auth::set_current_user(&self.session, &user).await?;
        self.user = Some(user);
        Ok(())
    }

    /// Replace the stored identity without rotating the session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session cannot be written.
    pub async fn refresh_user(&mut self, user: CurrentUser) -> Result<(), AppError> {
        super::auth::set_current_user(&self.session, &user).await?;
        self.user = Some(user);
        Ok(())
    }

    /// Drop everything in the session, cart included.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session cannot be flushed.
    pub async fn log_out(&mut self) -> Result<(), AppError> {
        self.session.flush().await?;
        self.user = None;
        Ok(())
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Collect layout data, consuming queued notices.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session cannot be read.
    pub async fn page(&self) -> Result<PageContext, AppError> {
        let flashes = self.take_flashes().await?;
        let cart_count = self.cart().await?.total_quantity();
        Ok(PageContext {
            user: self.user.clone(),
            flashes,
            cart_count,
        })
    }
}
