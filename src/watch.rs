use crate::report::ReportGenerator;
use crate::ui::LogUi;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

pub async fn run(generator: ReportGenerator, interval: Duration) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to wait for Ctrl+C");
        }
        info!("received Ctrl+C, stopping");
        let _ = shutdown_tx.send(true);
    });

    run_until(Arc::new(generator), interval, shutdown_rx).await;
}

/// Runs never overlap: each tick waits for the previous report.
pub async fn run_until(
    generator: Arc<ReportGenerator>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> usize {
    info!(interval = %humantime::format_duration(interval), "watch mode started");
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut runs = 0;

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                info!(runs, "watch mode stopped");
                break;
            }
            _ = ticker.tick() => {
                let generator = generator.clone();
                match tokio::task::spawn_blocking(move || generator.generate(&mut LogUi)).await {
                    Ok(Ok(report)) => {
                        runs += 1;
                        info!(
                            timestamp = %report.timestamp,
                            dir = %report.dir.display(),
                            logs = report.logs.len(),
                            html = report.html.is_some(),
                            breaches = report.breaches.len(),
                            "scheduled report written"
                        );
                    }
                    Ok(Err(err)) => error!(error = %err, "scheduled monitoring run failed"),
                    Err(err) => error!(error = %err, "monitoring task aborted"),
                }
            }
        }
    }

    runs
}
