use crate::collectors::readings::{ReadingSource, Readings};
use crate::config::ThresholdsConfig;
use crate::ui::Ui;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Memory,
    Cpu,
    Disk,
    Temperature,
}

impl Metric {
    fn title(self) -> &'static str {
        match self {
            Metric::Memory => "Memory usage",
            Metric::Cpu => "CPU usage",
            Metric::Disk => "Disk usage",
            Metric::Temperature => "CPU temperature",
        }
    }

    fn unit(self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            _ => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Breach {
    pub metric: Metric,
    pub value: f64,
    pub threshold: f64,
}

impl fmt::Display for Breach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.metric.unit();
        write!(
            f,
            "High {}: {:.0}{unit} (threshold {:.0}{unit})",
            self.metric.title(),
            self.value,
            self.threshold
        )
    }
}

/// Every breach in `readings`; each metric is judged on its own.
pub fn evaluate(readings: &Readings, thresholds: &ThresholdsConfig) -> Vec<Breach> {
    let checks = [
        (
            Metric::Memory,
            readings.memory_percent.map(f64::from),
            f64::from(thresholds.memory_percent),
        ),
        (
            Metric::Cpu,
            readings.cpu_percent.map(f64::from),
            f64::from(thresholds.cpu_percent),
        ),
        (
            Metric::Disk,
            readings.disk_percent.map(f64::from),
            f64::from(thresholds.disk_percent),
        ),
        (
            Metric::Temperature,
            readings.temperature_celsius,
            thresholds.temperature_celsius,
        ),
    ];

    checks
        .into_iter()
        .filter_map(|(metric, value, threshold)| {
            let value = value?;
            (value > threshold).then_some(Breach {
                metric,
                value,
                threshold,
            })
        })
        .collect()
}

pub struct ThresholdChecker {
    thresholds: ThresholdsConfig,
}

pub struct CheckOutcome {
    pub readings: Readings,
    pub breaches: Vec<Breach>,
}

impl ThresholdChecker {
    pub fn new(thresholds: ThresholdsConfig) -> Self {
        Self { thresholds }
    }

    pub fn check(&self, source: &dyn ReadingSource, ui: &mut dyn Ui) -> CheckOutcome {
        let readings = Readings::sample(source);
        let breaches = evaluate(&readings, &self.thresholds);
        if breaches.is_empty() {
            info!(?readings, "all readings within thresholds");
        }
        for breach in &breaches {
            warn!(
                metric = ?breach.metric,
                value = breach.value,
                threshold = breach.threshold,
                "threshold breached"
            );
            ui.alert(&breach.to_string());
        }
        CheckOutcome { readings, breaches }
    }
}
