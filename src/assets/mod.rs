//! Asset module - plain-text model, material and light files
//!
//! Line-oriented formats: blank lines and `#` comments are skipped,
//! whitespace separates fields. Parsing is all-or-nothing so a failed load
//! never leaves an engine half-updated.

mod loader;
mod shapes;

pub use loader::*;
pub use shapes::*;
