//! Ranked capture strategies

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::CaptureError;
use crate::platform::{DisplayServer, ProcessRunner, ToolLocator};
use crate::strategy::{Strategy, StrategyChain};

use super::frame::FrameBuffer;
use super::native::{DisplayBackend, X11Backend, capture_outputs};
use super::portal::{DesktopPortal, ScreenshotPortal, collect_portal_file};
use super::tools::{ranked_tools, run_tool};

const PORTAL_STRATEGY: &str = "xdg-desktop-portal";

/// A frame and the strategy that produced it
#[derive(Debug)]
pub struct Capture {
    pub frame: FrameBuffer,
    pub strategy: String,
}

/// Produces a [`FrameBuffer`] of the whole desktop
///
/// Tries installed screenshot tools first, then the native display API, then
/// (on Wayland) the desktop portal. The order depends only on the display
/// server family and which tools are installed.
pub struct CaptureEngine {
    config: Config,
    display_server: DisplayServer,
    runner: Arc<dyn ProcessRunner>,
    locator: Arc<dyn ToolLocator>,
    native: Box<dyn DisplayBackend>,
    portal: Box<dyn ScreenshotPortal>,
}

impl CaptureEngine {
    pub fn new(
        config: Config,
        display_server: DisplayServer,
        runner: Arc<dyn ProcessRunner>,
        locator: Arc<dyn ToolLocator>,
    ) -> Self {
        Self {
            config,
            display_server,
            runner,
            locator,
            native: Box::new(X11Backend::default()),
            portal: Box::new(DesktopPortal),
        }
    }

    pub fn with_native_backend(mut self, backend: Box<dyn DisplayBackend>) -> Self {
        self.native = backend;
        self
    }

    pub fn with_portal(mut self, portal: Box<dyn ScreenshotPortal>) -> Self {
        self.portal = portal;
        self
    }

    pub fn display_server(&self) -> DisplayServer {
        self.display_server
    }

    /// Strategy names in the order `capture` evaluates them
    pub fn plan(&self) -> Vec<String> {
        self.chain()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Upper bound on how long `capture` can block
    pub fn time_budget(&self) -> Duration {
        self.chain().time_budget()
    }

    pub fn capture(&self) -> Result<FrameBuffer, CaptureError> {
        self.capture_with_strategy().map(|capture| capture.frame)
    }

    pub fn capture_with_strategy(&self) -> Result<Capture, CaptureError> {
        let tools: Vec<&str> = ranked_tools(self.display_server)
            .iter()
            .map(|tool| tool.program)
            .collect();

        match self.chain().run() {
            Ok(success) => Ok(Capture {
                frame: success.value,
                strategy: success.strategy,
            }),
            Err(exhausted) => {
                let attempted = exhausted.attempted();
                let missing: Vec<String> = exhausted
                    .unavailable
                    .into_iter()
                    .filter(|name| tools.contains(&name.as_str()))
                    .collect();
                log::error!(
                    "Every capture strategy failed (tried: {:?}, missing: {:?})",
                    attempted,
                    missing
                );
                Err(CaptureError::NoBackendAvailable { attempted, missing })
            }
        }
    }

    fn chain(&self) -> StrategyChain<'_, FrameBuffer, CaptureError> {
        let mut chain = StrategyChain::new("capture");

        for tool in ranked_tools(self.display_server) {
            let path = self.locator.find(tool.program);
            let installed = path.is_some();
            chain.push(Strategy::new(
                tool.program,
                tool.timeout(&self.config),
                move || installed,
                move |timeout| match &path {
                    Some(path) => run_tool(self.runner.as_ref(), tool, path, timeout),
                    None => Err(CaptureError::ToolFailed {
                        tool: tool.program.to_string(),
                        status: None,
                        stderr: "not installed".to_string(),
                    }),
                },
            ));
        }

        chain.push(Strategy::new(
            format!("native:{}", self.native.name()),
            self.config.native_timeout(),
            move || self.native.is_available(),
            move |_| capture_outputs(self.native.as_ref()),
        ));

        if self.display_server.is_wayland() {
            let answer = self.config.portal_timeout();
            let file_wait = self.config.portal_file_wait();
            chain.push(Strategy::new(
                PORTAL_STRATEGY,
                answer + file_wait,
                move || self.portal.is_available(),
                move |_| {
                    let path = self.portal.request(answer)?;
                    collect_portal_file(&path, file_wait)
                },
            ));
        }

        chain
    }
}
