//! HTTP API layer for forkful.
//!
//! - **Endpoints**: recipes, users, subscriptions, tags, ingredients
//! - **Extractors**: token authentication, optional authentication
//! - **Middleware**: bearer-token resolution
//!
//! Built on Axum 0.8 with the Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
