use crate::ui::Ui;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: io::Error,
    },
}

pub trait Launcher {
    fn open(&self, path: &Path) -> Result<(), LaunchError>;
}

impl<L: Launcher + ?Sized> Launcher for &L {
    fn open(&self, path: &Path) -> Result<(), LaunchError> {
        (**self).open(path)
    }
}

#[derive(Debug, Clone)]
pub struct CommandLauncher {
    program: String,
}

impl CommandLauncher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Launcher for CommandLauncher {
    fn open(&self, path: &Path) -> Result<(), LaunchError> {
        Command::new(&self.program)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
            .map_err(|source| LaunchError::Spawn {
                program: self.program.clone(),
                source,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseOutcome {
    NoReports,
    Cancelled,
    Invalid(PathBuf),
    Browser(PathBuf),
    Text(PathBuf),
    /// The viewer could not be started or the file could not be read.
    Failed(PathBuf),
}

pub struct ReportBrowser<L> {
    log_dir: PathBuf,
    launcher: L,
}

impl<L: Launcher> ReportBrowser<L> {
    pub fn new(log_dir: impl Into<PathBuf>, launcher: L) -> Self {
        Self {
            log_dir: log_dir.into(),
            launcher,
        }
    }

    pub fn browse(&self, ui: &mut dyn Ui) -> BrowseOutcome {
        if !has_reports(&self.log_dir) {
            ui.info("No reports found. Run monitoring first.");
            return BrowseOutcome::NoReports;
        }

        let Some(selected) = ui.select_path("Select a report", &self.log_dir) else {
            ui.info("No report selected.");
            return BrowseOutcome::Cancelled;
        };

        let file = if selected.is_dir() {
            match ui.select_path("Select a file", &selected) {
                Some(file) => file,
                None => {
                    ui.info("No file selected.");
                    return BrowseOutcome::Cancelled;
                }
            }
        } else {
            selected
        };

        if !file.is_file() {
            ui.error(&format!("Invalid selection: {}", file.display()));
            return BrowseOutcome::Invalid(file);
        }

        self.display(&file, ui)
    }

    fn display(&self, file: &Path, ui: &mut dyn Ui) -> BrowseOutcome {
        if is_html(file) {
            info!(path = %file.display(), "opening report in browser");
            return match self.launcher.open(file) {
                Ok(()) => BrowseOutcome::Browser(file.to_path_buf()),
                Err(err) => {
                    warn!(error = %err, "browser launch failed");
                    ui.error(&err.to_string());
                    BrowseOutcome::Failed(file.to_path_buf())
                }
            };
        }

        match fs::read_to_string(file) {
            Ok(text) => {
                let title = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.display().to_string());
                ui.show_text(&title, &text);
                BrowseOutcome::Text(file.to_path_buf())
            }
            Err(err) => {
                ui.error(&format!("Cannot read {}: {err}", file.display()));
                BrowseOutcome::Failed(file.to_path_buf())
            }
        }
    }
}

fn has_reports(log_dir: &Path) -> bool {
    fs::read_dir(log_dir)
        .map(|mut rd| rd.any(|e| e.map(|e| e.path().is_dir()).unwrap_or(false)))
        .unwrap_or(false)
}

fn is_html(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".html"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeLauncher, ScriptedUi, UiEvent};

    struct Fixture {
        root: tempfile::TempDir,
        report: PathBuf,
    }

    fn fixture() -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let report = root.path().join("2026-10-16_10-00-00");
        fs::create_dir(&report).unwrap();
        fs::write(report.join("report_2026-10-16_10-00-00.md"), "# report\n").unwrap();
        fs::write(report.join("report_2026-10-16_10-00-00.html"), "<h1>r</h1>").unwrap();
        Fixture { root, report }
    }

    #[test]
    fn empty_log_root_reports_nothing_found() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("monitoring.log"), "note").unwrap();
        let launcher = FakeLauncher::default();
        let browser = ReportBrowser::new(root.path(), &launcher);
        let mut ui = ScriptedUi::default();

        assert_eq!(browser.browse(&mut ui), BrowseOutcome::NoReports);
        assert_eq!(
            ui.events,
            vec![UiEvent::Info("No reports found. Run monitoring first.".to_string())]
        );
        assert!(launcher.opened.borrow().is_empty());
    }

    #[test]
    fn missing_log_root_reports_nothing_found() {
        let root = tempfile::tempdir().unwrap();
        let browser = ReportBrowser::new(root.path().join("absent"), FakeLauncher::default());
        assert_eq!(
            browser.browse(&mut ScriptedUi::default()),
            BrowseOutcome::NoReports
        );
    }

    #[test]
    fn html_file_goes_to_browser() {
        let fx = fixture();
        let html = fx.report.join("report_2026-10-16_10-00-00.html");
        let launcher = FakeLauncher::default();
        let browser = ReportBrowser::new(fx.root.path(), &launcher);
        let mut ui = ScriptedUi::with_paths(vec![Some(html.clone())]);

        assert_eq!(browser.browse(&mut ui), BrowseOutcome::Browser(html.clone()));
        assert_eq!(*launcher.opened.borrow(), vec![html]);
        assert!(!ui.events.iter().any(|e| matches!(e, UiEvent::Text { .. })));
    }

    #[test]
    fn directory_then_markdown_goes_to_text_viewer() {
        let fx = fixture();
        let md = fx.report.join("report_2026-10-16_10-00-00.md");
        let launcher = FakeLauncher::default();
        let browser = ReportBrowser::new(fx.root.path(), &launcher);
        let mut ui = ScriptedUi::with_paths(vec![Some(fx.report.clone()), Some(md.clone())]);

        assert_eq!(browser.browse(&mut ui), BrowseOutcome::Text(md));
        assert_eq!(
            ui.events.last(),
            Some(&UiEvent::Text {
                title: "report_2026-10-16_10-00-00.md".to_string(),
                text: "# report\n".to_string(),
            })
        );
        assert!(launcher.opened.borrow().is_empty());
    }

    #[test]
    fn cancel_at_first_prompt_aborts() {
        let fx = fixture();
        let launcher = FakeLauncher::default();
        let browser = ReportBrowser::new(fx.root.path(), &launcher);
        let mut ui = ScriptedUi::with_paths(vec![None]);

        assert_eq!(browser.browse(&mut ui), BrowseOutcome::Cancelled);
        assert_eq!(
            ui.events,
            vec![UiEvent::Info("No report selected.".to_string())]
        );
        assert!(launcher.opened.borrow().is_empty());
    }

    #[test]
    fn cancel_inside_report_directory_aborts() {
        let fx = fixture();
        let launcher = FakeLauncher::default();
        let browser = ReportBrowser::new(fx.root.path(), &launcher);
        let mut ui = ScriptedUi::with_paths(vec![Some(fx.report.clone()), None]);

        assert_eq!(browser.browse(&mut ui), BrowseOutcome::Cancelled);
        assert_eq!(ui.events, vec![UiEvent::Info("No file selected.".to_string())]);
        assert!(launcher.opened.borrow().is_empty());
    }

    #[test]
    fn nonexistent_path_is_invalid() {
        let fx = fixture();
        let bogus = fx.root.path().join("nope.md");
        let browser = ReportBrowser::new(fx.root.path(), FakeLauncher::default());
        let mut ui = ScriptedUi::with_paths(vec![Some(bogus.clone())]);

        assert_eq!(browser.browse(&mut ui), BrowseOutcome::Invalid(bogus.clone()));
        assert_eq!(
            ui.events,
            vec![UiEvent::Error(format!("Invalid selection: {}", bogus.display()))]
        );
    }

    #[test]
    fn launch_failure_is_reported() {
        let fx = fixture();
        let html = fx.report.join("report_2026-10-16_10-00-00.html");
        let browser = ReportBrowser::new(
            fx.root.path(),
            CommandLauncher::new("hostwatch-no-such-browser"),
        );
        let mut ui = ScriptedUi::with_paths(vec![Some(html.clone())]);

        assert_eq!(browser.browse(&mut ui), BrowseOutcome::Failed(html));
        assert!(matches!(
            ui.events.last(),
            Some(UiEvent::Error(msg)) if msg.contains("hostwatch-no-such-browser")
        ));
    }
}
