//! Single-line text entry for the text annotation tool

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;

use super::locator::ToolLocator;
use super::process::{ProcessCommand, ProcessRunner};
use crate::strategy::{Strategy, StrategyChain};

/// Asks the user for a line of text
pub trait TextInputPrompt {
    /// `None` when the user cancelled or no prompt could be shown
    fn ask(&self, title: &str, label: &str) -> Option<String>;
}

/// Prompt through `zenity`, falling back to `kdialog`
pub struct DialogPrompt {
    runner: Arc<dyn ProcessRunner>,
    locator: Arc<dyn ToolLocator>,
    timeout: Duration,
}

impl DialogPrompt {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        locator: Arc<dyn ToolLocator>,
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            locator,
            timeout,
        }
    }

    fn entry_strategy<'a>(
        &'a self,
        program: &'static str,
        args: Vec<String>,
    ) -> Strategy<'a, Option<String>, anyhow::Error> {
        let path = self.locator.find(program);
        let probe_path = path.clone();
        Strategy::new(
            program,
            self.timeout,
            move || probe_path.is_some(),
            move |timeout| {
                let path = path.as_ref().ok_or_else(|| anyhow!("{program} not installed"))?;
                let command = ProcessCommand::new(path).args(args.iter());
                let output = self.runner.run(&command, timeout)?;
                match output.exit_code {
                    Some(0) => Ok(Some(trim_line_ending(&output.stdout_text()))),
                    // Cancel is an answer, not a reason to try the next dialog
                    Some(1) => Ok(None),
                    code => Err(anyhow!("{program} exited with {code:?}")),
                }
            },
        )
    }
}

impl TextInputPrompt for DialogPrompt {
    fn ask(&self, title: &str, label: &str) -> Option<String> {
        let mut chain = StrategyChain::new("text prompt");
        chain.push(self.entry_strategy(
            "zenity",
            vec![
                "--entry".to_string(),
                format!("--title={title}"),
                format!("--text={label}"),
            ],
        ));
        chain.push(self.entry_strategy(
            "kdialog",
            vec![
                "--title".to_string(),
                title.to_string(),
                "--inputbox".to_string(),
                label.to_string(),
            ],
        ));

        match chain.run() {
            Ok(success) => success.value,
            Err(exhausted) => {
                log::warn!(
                    "No text prompt could be shown (missing: {:?})",
                    exhausted.unavailable
                );
                None
            }
        }
    }
}

fn trim_line_ending(text: &str) -> String {
    text.trim_end_matches(['\n', '\r']).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessError;
    use crate::platform::process::ProcessOutput;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    struct Installed(Vec<&'static str>);

    impl ToolLocator for Installed {
        fn exists(&self, path: &Path) -> bool {
            self.0.iter().any(|p| Path::new(p) == path)
        }

        fn search_dirs(&self) -> Vec<PathBuf> {
            vec![PathBuf::from("/usr/bin")]
        }
    }

    struct Scripted {
        replies: RefCell<Vec<ProcessOutput>>,
        seen: RefCell<Vec<String>>,
    }

    impl ProcessRunner for Scripted {
        fn run(
            &self,
            command: &ProcessCommand,
            _timeout: Duration,
        ) -> Result<ProcessOutput, ProcessError> {
            self.seen.borrow_mut().push(command.display_name());
            Ok(self.replies.borrow_mut().remove(0))
        }
    }

    fn prompt(installed: Vec<&'static str>, replies: Vec<ProcessOutput>) -> (DialogPrompt, Arc<Scripted>) {
        let runner = Arc::new(Scripted {
            replies: RefCell::new(replies),
            seen: RefCell::new(Vec::new()),
        });
        let prompt = DialogPrompt::new(
            runner.clone(),
            Arc::new(Installed(installed)),
            Duration::from_secs(1),
        );
        (prompt, runner)
    }

    fn exited(code: i32, stdout: &str) -> ProcessOutput {
        ProcessOutput {
            exit_code: Some(code),
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        }
    }

    #[test]
    fn returns_entered_text_without_newline() {
        let (prompt, _) = prompt(vec!["/usr/bin/zenity"], vec![exited(0, "hello world\n")]);
        assert_eq!(prompt.ask("Text", "Enter text:"), Some("hello world".to_string()));
    }

    #[test]
    fn cancel_does_not_fall_through_to_next_dialog() {
        let (prompt, runner) = prompt(
            vec!["/usr/bin/zenity", "/usr/bin/kdialog"],
            vec![exited(1, "")],
        );
        assert_eq!(prompt.ask("Text", "Enter text:"), None);
        assert_eq!(*runner.seen.borrow(), vec!["zenity".to_string()]);
    }

    #[test]
    fn falls_back_to_kdialog_when_zenity_missing() {
        let (prompt, runner) = prompt(vec!["/usr/bin/kdialog"], vec![exited(0, "note\n")]);
        assert_eq!(prompt.ask("Text", "Enter text:"), Some("note".to_string()));
        assert_eq!(*runner.seen.borrow(), vec!["kdialog".to_string()]);
    }

    #[test]
    fn no_dialog_installed_means_no_text() {
        let (prompt, _) = prompt(Vec::new(), Vec::new());
        assert_eq!(prompt.ask("Text", "Enter text:"), None);
    }
}
