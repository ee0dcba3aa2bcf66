//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum, tower-http layers, body buffering)
//!     → request.rs (request ID)
//!     → routing::Router::serve (blocking pool)
//!     → response.rs (buffered writer → axum response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::ResponseWriter;
pub use server::{HttpServer, ServerError};
