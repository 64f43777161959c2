//! Mirror self-consistency rewriting.
//!
//! # Data Flow
//! ```text
//! inbound path → path.rs (segment-wise percent-encoding) → origin URL
//! origin 3xx   → location.rs (origin-absolute Location → mirror)
//! origin HTML  → html.rs (origin links → mirror, snippet injection)
//! ```

pub mod html;
pub mod location;
pub mod path;

pub use html::HtmlRewriter;
pub use location::fix_redirect_location;
pub use path::encode_path;
