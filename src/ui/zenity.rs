use super::{Choice, Ui};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{error, warn};

#[derive(Debug)]
pub struct ZenityUi {
    program: String,
    missing: bool,
}

impl Default for ZenityUi {
    fn default() -> Self {
        Self::new()
    }
}

impl ZenityUi {
    pub fn new() -> Self {
        Self {
            program: "zenity".to_string(),
            missing: false,
        }
    }

    fn run(&mut self, args: &[String], stdin_text: Option<&str>) -> Option<Output> {
        if self.missing {
            return None;
        }
        match self.spawn(args, stdin_text) {
            Ok(output) => Some(output),
            Err(err) => {
                if err.kind() == io::ErrorKind::NotFound {
                    self.missing = true;
                    error!(program = %self.program, "dialog tool is not installed");
                } else {
                    warn!(program = %self.program, error = %err, "dialog failed");
                }
                None
            }
        }
    }

    fn spawn(&self, args: &[String], stdin_text: Option<&str>) -> io::Result<Output> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .stdin(if stdin_text.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        let mut child = cmd.spawn()?;
        if let (Some(text), Some(mut stdin)) = (stdin_text, child.stdin.take()) {
            if let Err(err) = stdin.write_all(text.as_bytes()) {
                // The dialog may close before reading everything; reap it anyway.
                drop(stdin);
                let _ = child.wait();
                return Err(err);
            }
        }
        child.wait_with_output()
    }

    fn message(&mut self, kind: &str, message: &str) {
        let _ = self.run(&[format!("--{kind}"), format!("--text={message}")], None);
    }
}

fn selection(output: &Output) -> Option<String> {
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

impl Ui for ZenityUi {
    fn error(&mut self, message: &str) {
        self.message("error", message);
    }

    fn info(&mut self, message: &str) {
        self.message("info", message);
    }

    fn alert(&mut self, message: &str) {
        self.message("warning", message);
    }

    fn choose(&mut self, title: &str, options: &[&str]) -> Choice {
        let mut args = vec![
            "--list".to_string(),
            format!("--title={title}"),
            "--column=Option".to_string(),
        ];
        args.extend(options.iter().map(|o| o.to_string()));
        match self.run(&args, None) {
            None => Choice::Closed,
            Some(output) => selection(&output).map_or(Choice::Cancelled, Choice::Selected),
        }
    }

    fn select_path(&mut self, title: &str, start: &Path) -> Option<PathBuf> {
        let args = [
            "--file-selection".to_string(),
            format!("--title={title}"),
            format!("--filename={}/", start.display()),
        ];
        let output = self.run(&args, None)?;
        selection(&output).map(PathBuf::from)
    }

    fn show_text(&mut self, title: &str, text: &str) {
        let args = [
            "--text-info".to_string(),
            format!("--title={title}"),
            "--width=800".to_string(),
            "--height=600".to_string(),
        ];
        let _ = self.run(&args, Some(text));
    }
}
