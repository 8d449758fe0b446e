//! Pure domain types with minimal dependencies
//!
//! Types here have no platform dependencies so the capture, session and
//! render layers can share them freely.

pub mod annotation;
pub mod geometry;
pub mod selection;

pub use annotation::*;
pub use geometry::*;
pub use selection::*;
