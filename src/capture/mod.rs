//! Desktop capture
//!
//! - Captured image type (frame.rs)
//! - External screenshot programs (tools.rs)
//! - Native display grabs and multi-output compositing (native.rs)
//! - Desktop portal requests (portal.rs)
//! - Strategy ranking (engine.rs)

pub mod engine;
pub mod frame;
pub mod native;
pub mod portal;
pub mod tools;

pub use engine::{Capture, CaptureEngine};
pub use frame::FrameBuffer;
pub use native::{DisplayBackend, OutputInfo, X11Backend};
pub use portal::{DesktopPortal, ScreenshotPortal};
