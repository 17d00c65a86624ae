pub mod terminal;
pub mod zenity;

use crate::config::UiKind;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Selected(String),
    Cancelled,
    /// The front-end can no longer prompt (stdin closed, dialog tool missing).
    Closed,
}

pub trait Ui {
    fn error(&mut self, message: &str);
    fn info(&mut self, message: &str);
    /// Blocking threshold alert.
    fn alert(&mut self, message: &str);
    fn choose(&mut self, title: &str, options: &[&str]) -> Choice;
    /// `None` when the user selects nothing.
    fn select_path(&mut self, title: &str, start: &Path) -> Option<PathBuf>;
    fn show_text(&mut self, title: &str, text: &str);
}

pub fn build(kind: UiKind) -> Box<dyn Ui> {
    match kind {
        UiKind::Terminal => Box::new(terminal::TerminalUi::stdio()),
        UiKind::Zenity => Box::new(zenity::ZenityUi::new()),
    }
}

#[derive(Debug, Default)]
pub struct LogUi;

impl Ui for LogUi {
    fn error(&mut self, message: &str) {
        error!("{message}");
    }

    fn info(&mut self, message: &str) {
        info!("{message}");
    }

    fn alert(&mut self, message: &str) {
        warn!(alert = true, "{message}");
    }

    fn choose(&mut self, _title: &str, _options: &[&str]) -> Choice {
        Choice::Closed
    }

    fn select_path(&mut self, _title: &str, _start: &Path) -> Option<PathBuf> {
        None
    }

    fn show_text(&mut self, title: &str, text: &str) {
        info!(title, "{text}");
    }
}
