use crate::browser::{LaunchError, Launcher};
use crate::collectors::readings::{ParseError, ReadingError, ReadingSource};
use crate::collectors::{Category, CollectError, MetricCollector};
use crate::report::{RenderError, Renderer};
use crate::ui::{Choice, Ui};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

pub struct FakeCollector {
    category: Category,
    result: Result<String, String>,
}

impl FakeCollector {
    pub fn ok(category: Category, text: &str) -> Self {
        Self {
            category,
            result: Ok(text.to_string()),
        }
    }

    pub fn not_found(category: Category, program: &str) -> Self {
        Self {
            category,
            result: Err(program.to_string()),
        }
    }
}

impl MetricCollector for FakeCollector {
    fn category(&self) -> Category {
        self.category
    }

    fn collect(&self) -> Result<String, CollectError> {
        self.result.clone().map_err(|program| CollectError::NotFound { program })
    }
}

/// `None` fields fail like an unparsable tool output.
#[derive(Debug, Clone, Copy)]
pub struct FakeReadings {
    pub memory: Option<u8>,
    pub cpu: Option<u8>,
    pub disk: Option<u8>,
    pub temperature: Option<f64>,
}

impl FakeReadings {
    pub fn calm() -> Self {
        Self {
            memory: Some(10),
            cpu: Some(10),
            disk: Some(10),
            temperature: Some(40.0),
        }
    }
}

fn unparsable<T>(value: Option<T>) -> Result<T, ReadingError> {
    value.ok_or_else(|| ParseError::InvalidNumber("n/a".to_string()).into())
}

impl ReadingSource for FakeReadings {
    fn memory_percent(&self) -> Result<u8, ReadingError> {
        unparsable(self.memory)
    }

    fn cpu_percent(&self) -> Result<u8, ReadingError> {
        unparsable(self.cpu)
    }

    fn disk_percent(&self) -> Result<u8, ReadingError> {
        unparsable(self.disk)
    }

    fn temperature_celsius(&self) -> Result<f64, ReadingError> {
        self.temperature.ok_or(ReadingError::NoSensors)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderMode {
    Working,
    Missing,
    Failing,
    Silent,
}

pub struct FakeRenderer {
    mode: RenderMode,
}

impl FakeRenderer {
    pub fn working() -> Self {
        Self {
            mode: RenderMode::Working,
        }
    }

    pub fn missing() -> Self {
        Self {
            mode: RenderMode::Missing,
        }
    }

    /// Installed, but exits non-zero without writing anything.
    pub fn failing() -> Self {
        Self {
            mode: RenderMode::Failing,
        }
    }

    /// Reports success but never writes the HTML file.
    pub fn silent() -> Self {
        Self {
            mode: RenderMode::Silent,
        }
    }
}

impl Renderer for FakeRenderer {
    fn render(&self, _markdown: &Path, html: &Path) -> Result<(), RenderError> {
        match self.mode {
            RenderMode::Missing => Err(RenderError::Unavailable("pandoc".to_string())),
            RenderMode::Failing => Err(RenderError::Failed(CollectError::Status {
                program: "pandoc".to_string(),
                status: "exit status: 64".to_string(),
                stderr: "unknown reader".to_string(),
            })),
            RenderMode::Silent => Ok(()),
            RenderMode::Working => fs::write(html, "<html></html>").map_err(|source| {
                RenderError::Failed(CollectError::Spawn {
                    program: "fake".to_string(),
                    source,
                })
            }),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeLauncher {
    pub opened: RefCell<Vec<PathBuf>>,
}

impl Launcher for FakeLauncher {
    fn open(&self, path: &Path) -> Result<(), LaunchError> {
        self.opened.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Error(String),
    Info(String),
    Alert(String),
    Text { title: String, text: String },
}

/// Replays queued answers and records every message. An empty queue reads as closed/cancelled.
#[derive(Debug, Default)]
pub struct ScriptedUi {
    pub events: Vec<UiEvent>,
    choices: VecDeque<Choice>,
    paths: VecDeque<Option<PathBuf>>,
}

impl ScriptedUi {
    pub fn with_choices(choices: Vec<Choice>) -> Self {
        Self {
            choices: choices.into(),
            ..Self::default()
        }
    }

    pub fn with_paths(paths: Vec<Option<PathBuf>>) -> Self {
        Self {
            paths: paths.into(),
            ..Self::default()
        }
    }

    pub fn push_path(&mut self, path: Option<PathBuf>) {
        self.paths.push_back(path);
    }
}

impl Ui for ScriptedUi {
    fn error(&mut self, message: &str) {
        self.events.push(UiEvent::Error(message.to_string()));
    }

    fn info(&mut self, message: &str) {
        self.events.push(UiEvent::Info(message.to_string()));
    }

    fn alert(&mut self, message: &str) {
        self.events.push(UiEvent::Alert(message.to_string()));
    }

    fn choose(&mut self, _title: &str, _options: &[&str]) -> Choice {
        self.choices.pop_front().unwrap_or(Choice::Closed)
    }

    fn select_path(&mut self, _title: &str, _start: &Path) -> Option<PathBuf> {
        self.paths.pop_front().flatten()
    }

    fn show_text(&mut self, title: &str, text: &str) {
        self.events.push(UiEvent::Text {
            title: title.to_string(),
            text: text.to_string(),
        });
    }
}
