use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use snapmark::platform::{
    DisplayServer, FsToolLocator, NativeClipboard, ProcessRunner, SystemProcessRunner, ToolLocator,
};
use snapmark::{CaptureEngine, Compositor, Config, ExportRequest, ExportSink};

#[derive(Parser, Debug)]
#[command(
    name = "snapmark",
    version,
    about = "Capture the whole desktop and save it or copy it to the clipboard"
)]
struct Cli {
    /// Save to this path; the extension picks PNG, JPEG or BMP
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Copy to the clipboard (without --output nothing is saved)
    #[arg(long)]
    clipboard: bool,
    /// Print a JSON report instead of the saved path
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();
    let display_server = DisplayServer::detect();
    let runner: Arc<dyn ProcessRunner> = Arc::new(SystemProcessRunner::default());
    let locator: Arc<dyn ToolLocator> = Arc::new(FsToolLocator);

    let engine = CaptureEngine::new(
        config.clone(),
        display_server,
        runner.clone(),
        locator.clone(),
    );
    log::debug!(
        "Capture plan on {:?}: {:?} (at most {:?})",
        display_server,
        engine.plan(),
        engine.time_budget()
    );
    let capture = engine
        .capture_with_strategy()
        .context("Failed to capture the screen")?;
    let frame = capture.frame;
    log::info!(
        "Captured {}x{} with {}",
        frame.width(),
        frame.height(),
        capture.strategy
    );

    let bitmap = Compositor::new()
        .try_render(&frame, frame.bounds(), &[])
        .context("Captured frame is empty")?;

    let sink = ExportSink::new(
        &config,
        display_server,
        runner,
        locator,
        Box::new(NativeClipboard::default()),
    );
    let request = ExportRequest {
        save: cli.output.is_some() || !cli.clipboard,
        path: cli.output,
        clipboard: cli.clipboard,
    };
    let report = sink.export(&bitmap, &request);

    if cli.json {
        let json = serde_json::to_string_pretty(&report.summary())
            .context("Failed to serialize export report")?;
        println!("{json}");
    } else {
        if let Some(path) = report.saved_path() {
            println!("{}", path.display());
        }
        if let Some(Err(err)) = &report.file {
            eprintln!("save failed: {err}");
        }
        if let Some(Err(err)) = &report.clipboard {
            eprintln!("copy failed: {err}");
        }
    }

    if report.all_failed() {
        anyhow::bail!("No export succeeded");
    }
    Ok(())
}
