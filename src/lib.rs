//! Screen capture, region selection and annotation for Linux desktops
//!
//! A capture runs through [`CaptureEngine`], which ranks external screenshot
//! tools, the native display API and the desktop portal. The resulting
//! [`FrameBuffer`] feeds a [`ScreenshotSession`] where the user drags out a
//! region, annotates it, and exports the flattened bitmap through
//! [`ExportSink`].

pub mod annotations;
pub mod capture;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod platform;
pub mod render;
pub mod session;
pub mod strategy;

pub use annotations::AnnotationModel;
pub use capture::{Capture, CaptureEngine, FrameBuffer};
pub use config::{Config, ShapeColor};
pub use error::{CaptureError, CompositorError, ExportError, ProcessError};
pub use export::{ExportReport, ExportRequest, ExportSink};
pub use render::Compositor;
pub use session::{ScreenshotSession, SelectionController, SessionStep};
