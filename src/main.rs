mod alerts;
mod browser;
mod collectors;
mod config;
mod dashboard;
mod report;
#[cfg(test)]
mod testing;
mod ui;
mod watch;

use browser::{CommandLauncher, ReportBrowser};
use clap::Parser;
use config::{Config, UiKind};
use dashboard::Dashboard;
use report::ReportGenerator;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hostwatch")]
#[command(version)]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    print_default_config: bool,
    #[arg(long, value_enum)]
    ui: Option<UiKind>,
    #[arg(long, conflicts_with = "watch")]
    once: bool,
    /// Report every DURATION (e.g. `30s`, `5m`) until Ctrl+C.
    #[arg(
        long,
        value_name = "DURATION",
        num_args = 0..=1,
        value_parser = humantime::parse_duration
    )]
    watch: Option<Option<Duration>>,
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Config::example_yaml());
        return;
    }

    let mut cfg = match &cli.config {
        Some(path) => match Config::load_from_file(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                error!(error = %err, "failed to load configuration");
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };
    if let Some(ui) = cli.ui {
        cfg.ui = ui;
    }

    if let Err(err) = fs::create_dir_all(&cfg.log_dir) {
        error!(error = %err, log_dir = %cfg.log_dir.display(), "failed to create log directory");
        std::process::exit(1);
    }

    info!(
        log_dir = %cfg.log_dir.display(),
        ui = ?cfg.ui,
        "starting hostwatch"
    );

    let generator = ReportGenerator::from_config(&cfg);

    if cli.once {
        if let Err(err) = generator.generate(&mut ui::LogUi) {
            error!(error = %err, "monitoring run failed");
            std::process::exit(1);
        }
        return;
    }

    if let Some(every) = cli.watch {
        let interval = every.unwrap_or_else(|| Duration::from_secs(cfg.watch_interval_secs));
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(err) => {
                error!(error = %err, "failed to start async runtime");
                std::process::exit(1);
            }
        };
        runtime.block_on(watch::run(generator, interval));
        return;
    }

    let browser = ReportBrowser::new(
        cfg.log_dir.clone(),
        CommandLauncher::new(cfg.tools.browser.clone()),
    );
    let mut front_end = ui::build(cfg.ui);
    Dashboard::new(generator, browser).run(front_end.as_mut());
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
