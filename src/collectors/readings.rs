use super::command::run_tool;
use super::system;
use super::CollectError;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("no line starting with {0:?}")]
    MissingLine(&'static str),
    #[error("missing {0} column")]
    MissingColumn(&'static str),
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("value {0} is outside 0..100")]
    OutOfRange(f64),
}

#[derive(Debug, Error)]
pub enum ReadingError {
    #[error(transparent)]
    Collect(#[from] CollectError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("no temperature sensors found")]
    NoSensors,
}

pub trait ReadingSource: Send + Sync {
    fn memory_percent(&self) -> Result<u8, ReadingError>;
    /// Busy share of one sample window, `100 - idle`.
    fn cpu_percent(&self) -> Result<u8, ReadingError>;
    fn disk_percent(&self) -> Result<u8, ReadingError>;
    fn temperature_celsius(&self) -> Result<f64, ReadingError>;
}

/// One sample of every reading; `None` marks a reading that could not be taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Readings {
    pub memory_percent: Option<u8>,
    pub cpu_percent: Option<u8>,
    pub disk_percent: Option<u8>,
    pub temperature_celsius: Option<f64>,
}

impl Readings {
    pub fn sample(source: &dyn ReadingSource) -> Self {
        Self {
            memory_percent: keep("memory", source.memory_percent()),
            cpu_percent: keep("cpu", source.cpu_percent()),
            disk_percent: keep("disk", source.disk_percent()),
            temperature_celsius: keep("temperature", source.temperature_celsius()),
        }
    }
}

fn keep<T>(metric: &str, reading: Result<T, ReadingError>) -> Option<T> {
    match reading {
        Ok(v) => Some(v),
        Err(err) => {
            warn!(metric, error = %err, "reading unavailable, threshold check skipped");
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandReadings {
    disk_mount: String,
}

impl CommandReadings {
    pub fn new(disk_mount: impl Into<String>) -> Self {
        Self {
            disk_mount: disk_mount.into(),
        }
    }
}

impl ReadingSource for CommandReadings {
    fn memory_percent(&self) -> Result<u8, ReadingError> {
        let text = run_tool("free", &["-m"])?;
        Ok(parse_memory_percent(&text)?)
    }

    fn cpu_percent(&self) -> Result<u8, ReadingError> {
        let text = run_tool("mpstat", &["1", "1"])?;
        Ok(parse_cpu_usage(&text)?)
    }

    fn disk_percent(&self) -> Result<u8, ReadingError> {
        let text = run_tool("df", &["-P", self.disk_mount.as_str()])?;
        Ok(parse_disk_percent(&text)?)
    }

    fn temperature_celsius(&self) -> Result<f64, ReadingError> {
        system::hottest_cpu_temperature(&system::read_temperatures())
            .ok_or(ReadingError::NoSensors)
    }
}

pub fn parse_memory_percent(text: &str) -> Result<u8, ParseError> {
    let line = text
        .lines()
        .find(|l| l.trim_start().starts_with("Mem:"))
        .ok_or(ParseError::MissingLine("Mem:"))?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    let total = fields.get(1).ok_or(ParseError::MissingColumn("total"))?;
    let used = fields.get(2).ok_or(ParseError::MissingColumn("used"))?;
    let total = parse_number(total)?;
    let used = parse_number(used)?;
    if total <= 0.0 {
        return Err(ParseError::InvalidNumber(fields[1].to_string()));
    }
    to_percent(used / total * 100.0)
}

/// CPU usage from `mpstat` output, taken as `100 - %idle` of the `all` row.
pub fn parse_cpu_usage(text: &str) -> Result<u8, ParseError> {
    let header: Vec<&str> = text
        .lines()
        .find(|l| l.contains("%idle"))
        .ok_or(ParseError::MissingLine("%idle"))?
        .split_whitespace()
        .collect();
    let idle_pos = header
        .iter()
        .position(|f| *f == "%idle")
        .ok_or(ParseError::MissingColumn("%idle"))?;
    // Header and rows share their trailing columns; the leading time stamp
    // may be one or two fields depending on the locale.
    let from_end = header.len() - idle_pos;

    let rows: Vec<Vec<&str>> = text
        .lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>())
        .filter(|f| f.contains(&"all"))
        .collect();
    let row = rows
        .iter()
        .find(|f| f.first().is_some_and(|c| c.starts_with("Average")))
        .or_else(|| rows.last())
        .ok_or(ParseError::MissingLine("all"))?;
    let idle = row
        .len()
        .checked_sub(from_end)
        .and_then(|i| row.get(i))
        .ok_or(ParseError::MissingColumn("%idle"))?;

    let idle = parse_number(idle)?;
    if !(0.0..=100.0).contains(&idle) {
        return Err(ParseError::OutOfRange(idle));
    }
    to_percent(100.0 - idle)
}

pub fn parse_disk_percent(text: &str) -> Result<u8, ParseError> {
    let row = text
        .lines()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .last()
        .ok_or(ParseError::MissingLine("filesystem"))?;
    let capacity = row
        .split_whitespace()
        .find(|f| f.ends_with('%'))
        .ok_or(ParseError::MissingColumn("capacity"))?;
    let value = parse_number(capacity.trim_end_matches('%'))?;
    to_percent(value)
}

fn to_percent(value: f64) -> Result<u8, ParseError> {
    let rounded = value.round();
    if !(0.0..=100.0).contains(&rounded) {
        return Err(ParseError::OutOfRange(value));
    }
    Ok(rounded as u8)
}

/// Accepts both `12.5` and locale-style `12,5`.
fn parse_number(input: &str) -> Result<f64, ParseError> {
    let trimmed = input.trim();
    trimmed
        .parse::<f64>()
        .or_else(|_| trimmed.replace(',', ".").parse::<f64>())
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::InvalidNumber(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeReadings;

    const FREE_OUTPUT: &str = "\
               total        used        free      shared  buff/cache   available
Mem:           15862        6344        2514         912        7003        8265
Swap:           2047           0        2047
";

    const MPSTAT_OUTPUT: &str = "\
Linux 6.5.0 (host) \t10/16/2026 \t_x86_64_\t(8 CPU)

12:00:01 PM  CPU    %usr   %nice    %sys %iowait    %irq   %soft  %steal  %guest  %gnice   %idle
12:00:02 PM  all    5.02    0.00    2.01    0.25    0.00    0.13    0.00    0.00    0.00   92.59
Average:     all    5.02    0.00    2.01    0.25    0.00    0.13    0.00    0.00    0.00   92.59
";

    const DF_OUTPUT: &str = "\
Filesystem     1024-blocks      Used Available Capacity Mounted on
/dev/nvme0n1p2   490617784 201232788 264362860      44% /
";

    #[test]
    fn memory_percent_is_used_over_total() {
        // 6344 / 15862 = 39.99 %
        assert_eq!(parse_memory_percent(FREE_OUTPUT), Ok(40));
    }

    #[test]
    fn memory_without_mem_row_is_an_error() {
        assert_eq!(
            parse_memory_percent("Swap: 1 2 3\n"),
            Err(ParseError::MissingLine("Mem:"))
        );
    }

    #[test]
    fn memory_with_zero_total_is_an_error() {
        assert!(parse_memory_percent("Mem: 0 0 0\n").is_err());
    }

    #[test]
    fn cpu_usage_is_hundred_minus_idle() {
        assert_eq!(parse_cpu_usage(MPSTAT_OUTPUT), Ok(7));
    }

    #[test]
    fn cpu_usage_handles_24h_clock_and_decimal_comma() {
        let text = "\
12:00:01     CPU    %usr   %idle
12:00:02     all   40,00   12,50
";
        assert_eq!(parse_cpu_usage(text), Ok(88));
    }

    #[test]
    fn cpu_usage_rejects_garbage_idle() {
        let text = "CPU %idle\nall n/a\n";
        assert_eq!(
            parse_cpu_usage(text),
            Err(ParseError::InvalidNumber("n/a".to_string()))
        );
    }

    #[test]
    fn cpu_usage_without_header_is_an_error() {
        assert_eq!(
            parse_cpu_usage("mpstat: command not found"),
            Err(ParseError::MissingLine("%idle"))
        );
    }

    #[test]
    fn disk_percent_reads_capacity_column() {
        assert_eq!(parse_disk_percent(DF_OUTPUT), Ok(44));
    }

    #[test]
    fn disk_percent_without_rows_is_an_error() {
        let header_only = "Filesystem 1024-blocks Used Available Capacity Mounted on\n";
        assert_eq!(
            parse_disk_percent(header_only),
            Err(ParseError::MissingLine("filesystem"))
        );
    }

    #[test]
    fn sample_turns_failures_into_none() {
        let source = FakeReadings {
            memory: Some(81),
            cpu: None,
            disk: Some(10),
            temperature: None,
        };
        let readings = Readings::sample(&source);
        assert_eq!(readings.memory_percent, Some(81));
        assert_eq!(readings.cpu_percent, None);
        assert_eq!(readings.disk_percent, Some(10));
        assert_eq!(readings.temperature_celsius, None);
    }
}
