use super::{Choice, Ui};
use std::fs;
use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct TerminalUi<R, W> {
    input: R,
    output: W,
}

impl TerminalUi<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalUi<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(err) => {
                debug!(error = %err, "failed to read from terminal");
                None
            }
        }
    }

    // Terminal output errors are not actionable; prompts carry on.
    fn say(&mut self, text: &str) {
        let _ = writeln!(self.output, "{text}");
        let _ = self.output.flush();
    }

    fn prompt(&mut self, text: &str) {
        let _ = write!(self.output, "{text}");
        let _ = self.output.flush();
    }
}

impl<R: BufRead, W: Write> Ui for TerminalUi<R, W> {
    fn error(&mut self, message: &str) {
        self.say(&format!("[error] {message}"));
    }

    fn info(&mut self, message: &str) {
        self.say(&format!("[info] {message}"));
    }

    fn alert(&mut self, message: &str) {
        self.say(&format!("[ALERT] {message}"));
        self.prompt("press Enter to acknowledge");
        let _ = self.read_line();
    }

    fn choose(&mut self, title: &str, options: &[&str]) -> Choice {
        self.say(&format!("\n== {title} =="));
        for (i, option) in options.iter().enumerate() {
            self.say(&format!("  {}) {option}", i + 1));
        }
        self.prompt("> ");
        match self.read_line() {
            None => Choice::Closed,
            Some(line) if line.is_empty() => Choice::Cancelled,
            Some(line) => Choice::Selected(line),
        }
    }

    fn select_path(&mut self, title: &str, start: &Path) -> Option<PathBuf> {
        let mut entries: Vec<PathBuf> = fs::read_dir(start)
            .map(|rd| rd.flatten().map(|e| e.path()).collect())
            .unwrap_or_default();
        entries.sort();

        self.say(&format!("\n== {title} ({}) ==", start.display()));
        for (i, entry) in entries.iter().enumerate() {
            let name = entry
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let marker = if entry.is_dir() { "/" } else { "" };
            self.say(&format!("  {}) {name}{marker}", i + 1));
        }
        self.prompt("number or path (empty to cancel)> ");

        let line = self.read_line()?;
        if line.is_empty() {
            return None;
        }
        if let Ok(n) = line.parse::<usize>() {
            if let Some(entry) = n.checked_sub(1).and_then(|i| entries.get(i)) {
                return Some(entry.clone());
            }
        }
        Some(start.join(line))
    }

    fn show_text(&mut self, title: &str, text: &str) {
        self.say(&format!("\n----- {title} -----"));
        self.say(text.trim_end());
        self.say(&format!("----- end of {title} -----"));
        self.prompt("press Enter to continue");
        let _ = self.read_line();
    }
}
