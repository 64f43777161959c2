//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, route table)
//!     → request.rs (request ID, mirror origin, outbound headers)
//!     → [proxy pipeline or management handlers]
//!     → response.rs (inbound header filter, ResponseDraft → response)
//!     → Send to client
//! ```
//!
//! headers.rs holds the one header representation every transform works on.

pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use headers::HeaderBag;
pub use request::{MirrorOrigin, X_REQUEST_ID};
pub use response::ResponseDraft;
pub use server::{AppState, HttpServer};
