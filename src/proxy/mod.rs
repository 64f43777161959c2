//! Mirror proxy subsystem.
//!
//! # Data Flow
//! ```text
//! axum request
//!     → handler.rs (read body under the size limit, resolve mirror origin)
//!     → pipeline.rs (cache lookup, forward, classify, store or bypass)
//!     → ResponseDraft → axum response
//! ```
//!
//! # Design Decisions
//! - The pipeline knows nothing about axum extractors; the handler adapts
//! - No single-flight: concurrent misses for one URL each reach the origin,
//!   and the last response stored wins
//! - Cache writes happen after the origin body is fully buffered, so a client
//!   disconnect can cancel the origin call but never a half-finished write

pub mod handler;
pub mod pipeline;

pub use handler::proxy_handler;
pub use pipeline::{InboundRequest, ProxyPipeline};
