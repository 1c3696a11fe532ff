//! HTTP middleware stack for admin.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Security headers (no framing, no caching, CSP)
//! 4. Session layer (tower-sessions with the in-process store, holds flash messages)

pub mod security_headers;
pub mod session;

pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
