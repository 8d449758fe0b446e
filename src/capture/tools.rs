//! External screenshot programs
//!
//! The table is ranked: Wayland-native tools come first on Wayland sessions,
//! then desktop tools that work on either family, then plain X11 grabbers.

use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use crate::config::Config;
use crate::error::{CaptureError, ProcessError};
use crate::platform::{DisplayServer, ProcessCommand, ProcessRunner};

use super::frame::{FrameBuffer, decode_file};

/// Placeholder replaced by the output file path
const OUT: &str = "{out}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSpeed {
    /// Writes the file and exits
    Fast,
    /// May round-trip through a portal or show UI
    Interactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFilter {
    WaylandOnly,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenshotTool {
    pub program: &'static str,
    pub args: &'static [&'static str],
    pub speed: ToolSpeed,
    pub sessions: SessionFilter,
}

pub const SCREENSHOT_TOOLS: &[ScreenshotTool] = &[
    ScreenshotTool {
        program: "grim",
        args: &[OUT],
        speed: ToolSpeed::Fast,
        sessions: SessionFilter::WaylandOnly,
    },
    ScreenshotTool {
        program: "spectacle",
        args: &["-b", "-n", "-o", OUT],
        speed: ToolSpeed::Fast,
        sessions: SessionFilter::WaylandOnly,
    },
    ScreenshotTool {
        program: "gnome-screenshot",
        args: &["-f", OUT],
        speed: ToolSpeed::Interactive,
        sessions: SessionFilter::Any,
    },
    ScreenshotTool {
        program: "ksnip",
        args: &["-f", "-s", "-p", OUT],
        speed: ToolSpeed::Fast,
        sessions: SessionFilter::Any,
    },
    ScreenshotTool {
        program: "spectacle",
        args: &["-b", "-n", "-o", OUT],
        speed: ToolSpeed::Fast,
        sessions: SessionFilter::Any,
    },
    ScreenshotTool {
        program: "scrot",
        args: &[OUT],
        speed: ToolSpeed::Fast,
        sessions: SessionFilter::Any,
    },
    ScreenshotTool {
        program: "maim",
        args: &[OUT],
        speed: ToolSpeed::Fast,
        sessions: SessionFilter::Any,
    },
    ScreenshotTool {
        program: "import",
        args: &["-window", "root", OUT],
        speed: ToolSpeed::Fast,
        sessions: SessionFilter::Any,
    },
];

impl ScreenshotTool {
    pub fn applies_to(&self, display: DisplayServer) -> bool {
        match self.sessions {
            SessionFilter::WaylandOnly => display.is_wayland(),
            SessionFilter::Any => true,
        }
    }

    pub fn timeout(&self, config: &Config) -> Duration {
        match self.speed {
            ToolSpeed::Fast => config.fast_tool_timeout(),
            ToolSpeed::Interactive => config.interactive_tool_timeout(),
        }
    }

    pub fn command(&self, program_path: &Path, output: &Path) -> ProcessCommand {
        let args = self.args.iter().map(|arg| {
            if *arg == OUT {
                output.as_os_str().to_os_string()
            } else {
                OsString::from(*arg)
            }
        });
        ProcessCommand::new(program_path).args(args)
    }
}

/// Tools applicable to `display`, in rank order, first occurrence of each program
pub fn ranked_tools(display: DisplayServer) -> Vec<&'static ScreenshotTool> {
    let mut seen = Vec::new();
    SCREENSHOT_TOOLS
        .iter()
        .filter(|tool| tool.applies_to(display))
        .filter(|tool| {
            if seen.contains(&tool.program) {
                false
            } else {
                seen.push(tool.program);
                true
            }
        })
        .collect()
}

/// Run one tool into a scoped temp directory and decode what it wrote
///
/// The directory and anything the tool left in it are removed on every path
/// out of this function.
pub fn run_tool(
    runner: &dyn ProcessRunner,
    tool: &ScreenshotTool,
    program_path: &Path,
    timeout: Duration,
) -> Result<FrameBuffer, CaptureError> {
    let dir = tempfile::Builder::new().prefix("snapmark-").tempdir()?;
    let output = dir.path().join("capture.png");
    let command = tool.command(program_path, &output);

    let result = runner.run(&command, timeout).map_err(|e| match e {
        ProcessError::TimedOut { timeout, .. } => CaptureError::ToolTimeout {
            tool: tool.program.to_string(),
            timeout,
        },
        other => CaptureError::ToolFailed {
            tool: tool.program.to_string(),
            status: None,
            stderr: other.to_string(),
        },
    })?;
    if !result.success() {
        return Err(CaptureError::ToolFailed {
            tool: tool.program.to_string(),
            status: result.exit_code,
            stderr: result.stderr_text(),
        });
    }

    decode_file(&output, tool.program)
}
