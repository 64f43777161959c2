//! Caching mirror proxy library.
//!
//! Serves a single origin under the mirror's own host, caching eligible GET
//! responses in a bounded in-memory store and rewriting origin links and
//! redirects so clients stay on the mirror.

pub mod admin;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod rewrite;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use error::{ProxyError, Result};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
