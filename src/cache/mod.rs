//! Response caching subsystem.
//!
//! # Data Flow
//! ```text
//! GET request (proxied path)
//!     → adapter.rs lookup("cache:<url>") → store.rs (LRU + TTL)
//!         hit  → serve stored entry
//!         miss → forward to origin
//!             → policy.rs evaluate (strategy, classifier.rs, Cache-Control)
//!             → adapter.rs store on Store decision
//! ```
//!
//! # Design Decisions
//! - Strategy `off` short-circuits both reads and writes
//! - Concurrent misses for the same key all reach the origin; the last
//!   completed write wins. There is no request coalescing.
//! - Expiry is owned by the store, entries never re-check their age

pub mod adapter;
pub mod classifier;
pub mod policy;
pub mod store;

pub use adapter::{CacheEntry, CacheInfo, CacheStats, CacheStoreAdapter};
pub use classifier::is_static;
pub use policy::{BypassReason, CacheDecision, CachePolicy, BYPASS_CACHE_CONTROL};
pub use store::BoundedStore;
