//! Annotation history and drawing gestures
//!
//! This module provides:
//! - The committed annotation list with undo (model.rs)
//! - Press-drag-release gesture tracking (gesture.rs)

pub mod gesture;
pub mod model;

pub use gesture::Gesture;
pub use model::AnnotationModel;
