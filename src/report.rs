//! One monitoring run: collect every category, check thresholds, aggregate
//! the logs into a Markdown report and render it to HTML when possible.
//!
//! Layout of a run stamped `T`:
//!
//! ```text
//! <log_dir>/T/{cpu,gpu,memory,disk,network,load}_T.log
//! <log_dir>/T/report_T.md
//! <log_dir>/T/report_T.html     (only with a renderer)
//! <log_dir>/T/summary_T.json
//! <log_dir>/monitoring.log      (skip notices, shared by all runs)
//! ```

use crate::alerts::{Breach, ThresholdChecker};
use crate::collectors::command::run_tool;
use crate::collectors::readings::{CommandReadings, ReadingSource, Readings};
use crate::collectors::{default_collectors, CollectError, MetricCollector};
use crate::config::Config;
use crate::ui::Ui;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::ffi::OsStr;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to create report directory {path}: {source}")]
    CreateDir { path: String, source: io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: String, source: io::Error },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{0} is not installed")]
    Unavailable(String),
    #[error(transparent)]
    Failed(CollectError),
}

pub trait Renderer: Send + Sync {
    fn render(&self, markdown: &Path, html: &Path) -> Result<(), RenderError>;
}

#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Renderer for CommandRenderer {
    fn render(&self, markdown: &Path, html: &Path) -> Result<(), RenderError> {
        let args = [markdown.as_os_str(), OsStr::new("-o"), html.as_os_str()];
        match run_tool(&self.program, &args) {
            Ok(_) => Ok(()),
            Err(CollectError::NotFound { program }) => Err(RenderError::Unavailable(program)),
            Err(err) => Err(RenderError::Failed(err)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub timestamp: String,
    pub dir: PathBuf,
    pub logs: Vec<PathBuf>,
    pub markdown: PathBuf,
    pub html: Option<PathBuf>,
    pub breaches: Vec<Breach>,
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    timestamp: &'a str,
    readings: Readings,
    breaches: &'a [Breach],
    html: bool,
}

pub struct ReportGenerator {
    log_dir: PathBuf,
    monitoring_log: PathBuf,
    collectors: Vec<Box<dyn MetricCollector>>,
    readings: Box<dyn ReadingSource>,
    renderer: Box<dyn Renderer>,
    checker: ThresholdChecker,
}

impl ReportGenerator {
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg,
            default_collectors(&cfg.tools),
            Box::new(CommandReadings::new(cfg.tools.disk_mount.clone())),
            Box::new(CommandRenderer::new(cfg.tools.renderer.clone())),
        )
    }

    pub fn new(
        cfg: &Config,
        collectors: Vec<Box<dyn MetricCollector>>,
        readings: Box<dyn ReadingSource>,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        Self {
            log_dir: cfg.log_dir.clone(),
            monitoring_log: cfg.monitoring_log(),
            collectors,
            readings,
            renderer,
            checker: ThresholdChecker::new(cfg.thresholds),
        }
    }

    pub fn generate(&self, ui: &mut dyn Ui) -> Result<Report, ReportError> {
        self.generate_at(Local::now().naive_local(), ui)
    }

    /// Only a missing report directory or an unwritable Markdown file fail the run.
    pub fn generate_at(&self, now: NaiveDateTime, ui: &mut dyn Ui) -> Result<Report, ReportError> {
        let (dir, timestamp) = create_report_dir(&self.log_dir, now)?;
        info!(report = %dir.display(), "monitoring run started");

        let logs = self.write_logs(&dir, &timestamp);

        let outcome = self.checker.check(self.readings.as_ref(), ui);

        let markdown = dir.join(format!("report_{timestamp}.md"));
        let content = build_markdown(&dir, &timestamp);
        fs::write(&markdown, content).map_err(|source| ReportError::Write {
            path: markdown.display().to_string(),
            source,
        })?;

        let html = self.render_html(&markdown, &dir, &timestamp);

        let summary = RunSummary {
            timestamp: &timestamp,
            readings: outcome.readings,
            breaches: &outcome.breaches,
            html: html.is_some(),
        };
        write_summary(&dir.join(format!("summary_{timestamp}.json")), &summary);

        info!(
            report = %markdown.display(),
            breaches = outcome.breaches.len(),
            html = html.is_some(),
            "monitoring run finished"
        );
        ui.info(&format!("Report generated: {}", markdown.display()));

        Ok(Report {
            timestamp,
            dir,
            logs,
            markdown,
            html,
            breaches: outcome.breaches,
        })
    }

    fn write_logs(&self, dir: &Path, timestamp: &str) -> Vec<PathBuf> {
        let mut written = Vec::with_capacity(self.collectors.len());
        for collector in &self.collectors {
            let category = collector.category();
            let path = dir.join(format!("{category}_{timestamp}.log"));
            let content = match collector.collect() {
                Ok(text) => text,
                Err(err) => {
                    warn!(%category, error = %err, "collector failed");
                    format!("Failed to collect {category} metrics: {err}\n")
                }
            };
            match fs::write(&path, content) {
                Ok(()) => written.push(path),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to write metric log");
                }
            }
        }
        written
    }

    fn render_html(&self, markdown: &Path, dir: &Path, timestamp: &str) -> Option<PathBuf> {
        let html = dir.join(format!("report_{timestamp}.html"));
        match self.renderer.render(markdown, &html) {
            Ok(()) if html.is_file() => Some(html),
            Ok(()) => {
                warn!(path = %html.display(), "renderer produced no HTML file");
                None
            }
            Err(RenderError::Unavailable(program)) => {
                self.note(&format!(
                    "{timestamp}: HTML generation skipped, {program} is not installed"
                ));
                None
            }
            Err(err) => {
                warn!(error = %err, "HTML rendering failed");
                self.note(&format!("{timestamp}: HTML generation failed: {err}"));
                None
            }
        }
    }

    fn note(&self, message: &str) {
        if let Err(err) = append_monitoring_log(&self.monitoring_log, message) {
            warn!(
                path = %self.monitoring_log.display(),
                error = %err,
                "failed to append to monitoring log"
            );
        }
    }
}

/// Creates `<log_dir>/<timestamp>`, moving one second forward while the name is taken.
fn create_report_dir(log_dir: &Path, now: NaiveDateTime) -> Result<(PathBuf, String), ReportError> {
    let create_err = |path: &Path, source| ReportError::CreateDir {
        path: path.display().to_string(),
        source,
    };
    fs::create_dir_all(log_dir).map_err(|source| create_err(log_dir, source))?;

    let mut at = now;
    loop {
        let timestamp = at.format(TIMESTAMP_FORMAT).to_string();
        let dir = log_dir.join(&timestamp);
        match fs::create_dir(&dir) {
            Ok(()) => return Ok((dir, timestamp)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                at += chrono::Duration::seconds(1);
            }
            Err(source) => return Err(create_err(&dir, source)),
        }
    }
}

/// One `## <category>` section per `*_<timestamp>.log` file, in file name order.
pub fn build_markdown(dir: &Path, timestamp: &str) -> String {
    let suffix = format!("_{timestamp}.log");
    let mut logs: Vec<(String, PathBuf)> = fs::read_dir(dir)
        .map(|rd| {
            rd.flatten()
                .filter_map(|entry| {
                    let name = entry.file_name().into_string().ok()?;
                    let category = name.strip_suffix(&suffix)?.to_string();
                    Some((category, entry.path()))
                })
                .collect()
        })
        .unwrap_or_default();
    logs.sort_by(|a, b| a.1.cmp(&b.1));

    let mut md = format!("# System report {timestamp}\n");
    for (category, path) in logs {
        let mut content = fs::read_to_string(&path)
            .unwrap_or_else(|err| format!("(unreadable: {err})\n"));
        if !content.ends_with('\n') {
            content.push('\n');
        }
        let fence = code_fence(&content);
        md.push_str(&format!("\n## {category}\n\n{fence}\n{content}{fence}\n"));
    }
    md
}

// A fence must be longer than any backtick run inside the block.
fn code_fence(content: &str) -> String {
    let longest = content
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

fn write_summary(path: &Path, summary: &RunSummary<'_>) {
    let result = serde_json::to_vec_pretty(summary)
        .map_err(io::Error::from)
        .and_then(|bytes| fs::write(path, bytes));
    if let Err(err) = result {
        warn!(path = %path.display(), error = %err, "failed to write run summary");
    }
}

pub fn append_monitoring_log(path: &Path, message: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(
        file,
        "[{}] {message}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}
