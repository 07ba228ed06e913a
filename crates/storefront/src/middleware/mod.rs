//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, error capture)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (correlate logs and Sentry events)
//! 4. Security headers (CSP, frame denial, no-store)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Rate limiting on login and registration submissions (governor)

pub mod auth;
pub mod context;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    LOGIN_REQUIRED_FEATURE, LOGIN_REQUIRED_PAGE, OptionalAuth, RequireAuth, set_current_user,
};
pub use context::{PageContext, RequestContext, push_flash};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_layer_with_store};
