use super::{Category, CollectError, MetricCollector};
use std::ffi::OsStr;
use std::io;
use std::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct CommandStep {
    program: String,
    args: Vec<String>,
    optional: bool,
    quiet: bool,
}

impl CommandStep {
    pub fn required(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            optional: false,
            quiet: false,
        }
    }

    /// A missing or failing optional tool leaves a placeholder line instead of an error.
    pub fn optional(program: &str, args: &[&str]) -> Self {
        Self {
            optional: true,
            ..Self::required(program, args)
        }
    }

    /// Keep stderr out of the log when the step fails.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    fn placeholder(&self, err: &CollectError) -> String {
        match err {
            CollectError::NotFound { .. } => {
                format!("{} is not installed; skipped.\n", self.program)
            }
            _ if self.quiet => format!("{} information unavailable.\n", self.program),
            other => format!("{} failed: {other}\n", self.program),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandCollector {
    category: Category,
    steps: Vec<CommandStep>,
}

impl CommandCollector {
    pub fn new(category: Category, steps: Vec<CommandStep>) -> Self {
        Self { category, steps }
    }
}

impl MetricCollector for CommandCollector {
    fn category(&self) -> Category {
        self.category
    }

    // Err only when no step produced output and a required one failed.
    fn collect(&self) -> Result<String, CollectError> {
        let mut out = String::new();
        let mut any_ran = false;
        let mut first_failure = None;
        for step in &self.steps {
            match run_tool(&step.program, &step.args) {
                Ok(text) => {
                    any_ran = true;
                    out.push_str(&text);
                }
                Err(err) if step.optional => {
                    debug!(
                        category = %self.category,
                        program = %step.program,
                        error = %err,
                        "optional tool skipped"
                    );
                    out.push_str(&step.placeholder(&err));
                }
                Err(err) => {
                    warn!(
                        category = %self.category,
                        program = %step.program,
                        error = %err,
                        "required tool failed"
                    );
                    out.push_str(&format!("Failed to run {}: {err}\n", step.program));
                    if first_failure.is_none() {
                        first_failure = Some(err);
                    }
                }
            }
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }
        match first_failure {
            Some(err) if !any_ran => Err(err),
            _ => Ok(out),
        }
    }
}

/// Runs `program` to completion and returns its stdout. A non-zero exit is
/// an error only when nothing was printed: `smartctl -H` and `sensors` encode
/// findings in the exit status while still reporting on stdout.
pub fn run_tool<S: AsRef<OsStr>>(program: &str, args: &[S]) -> Result<String, CollectError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| spawn_error(program, source))?;

    let stdout = decode_cmd_output(&output.stdout);
    if output.status.success() || !stdout.trim().is_empty() {
        if !output.status.success() {
            debug!(program, status = %output.status, "tool exited non-zero with output");
        }
        return Ok(stdout);
    }

    Err(CollectError::Status {
        program: program.to_string(),
        status: output.status.to_string(),
        stderr: decode_cmd_output(&output.stderr).trim().to_string(),
    })
}

pub fn spawn_error(program: &str, source: io::Error) -> CollectError {
    if source.kind() == io::ErrorKind::NotFound {
        CollectError::NotFound {
            program: program.to_string(),
        }
    } else {
        CollectError::Spawn {
            program: program.to_string(),
            source,
        }
    }
}

fn decode_cmd_output(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
