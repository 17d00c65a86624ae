pub mod command;
pub mod readings;
pub mod system;

use crate::config::ToolsConfig;
use command::{CommandCollector, CommandStep};
use std::fmt;
use thiserror::Error;

/// Metric category; its name is the log file prefix and the report heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Cpu,
    Gpu,
    Memory,
    Disk,
    Network,
    Load,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Cpu,
        Category::Gpu,
        Category::Memory,
        Category::Disk,
        Category::Network,
        Category::Load,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Cpu => "cpu",
            Category::Gpu => "gpu",
            Category::Memory => "memory",
            Category::Disk => "disk",
            Category::Network => "network",
            Category::Load => "load",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("{program} is not installed")]
    NotFound { program: String },
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Status {
        program: String,
        status: String,
        stderr: String,
    },
}

pub trait MetricCollector: Send + Sync {
    fn category(&self) -> Category;
    fn collect(&self) -> Result<String, CollectError>;
}

pub fn default_collectors(tools: &ToolsConfig) -> Vec<Box<dyn MetricCollector>> {
    Category::ALL
        .iter()
        .map(|&category| {
            Box::new(CommandCollector::new(category, steps_for(category, tools)))
                as Box<dyn MetricCollector>
        })
        .collect()
}

fn steps_for(category: Category, tools: &ToolsConfig) -> Vec<CommandStep> {
    match category {
        Category::Cpu => vec![
            CommandStep::required("mpstat", &["1", "1"]),
            CommandStep::optional("sensors", &[]),
        ],
        Category::Gpu => vec![CommandStep::optional("lshw", &["-C", "display"])],
        Category::Memory => vec![CommandStep::required("free", &["-h"])],
        // smartctl needs root on most hosts, so its failures stay out of the log.
        Category::Disk => vec![
            CommandStep::required("df", &["-h"]),
            CommandStep::optional("smartctl", &["-H", tools.smart_device.as_str()]).quiet(),
        ],
        Category::Network => vec![
            CommandStep::required("ip", &["-s", "link"]),
            CommandStep::optional("ss", &["-s"]),
        ],
        Category::Load => vec![CommandStep::required("uptime", &[])],
    }
}
