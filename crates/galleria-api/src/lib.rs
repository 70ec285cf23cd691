//! Galleria API crate - axum HTTP surface for the assistant backend.
//!
//! Thin request handlers composing the session manager, message store,
//! prompt assembler, completion collaborator, and response post-processor.
//! Session identity rides a cookie; cross-site callers use credentialed CORS.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod session;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
