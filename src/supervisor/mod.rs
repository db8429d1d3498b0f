use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::SupervisorConfig;
use crate::error::{LaunchError, SupervisorError};
use crate::report::{self, RunResult};
use crate::supervisor::monitor::{LimitType, MonitorLoop};
use crate::supervisor::priority::PriorityAdapter;
use crate::supervisor::probe::SysinfoProbe;

mod io_pump;
mod launcher;
pub mod monitor;
pub mod priority;
pub mod probe;

pub use launcher::ChildHandle;

/// Supervises one external executable per run: spawns it with piped stdio,
/// pumps the streams, polls resource usage, and terminates the child when a
/// bound is violated.
#[derive(Debug)]
pub struct Supervisor {
    executable: PathBuf,
    config: SupervisorConfig,
    priority: Box<dyn PriorityAdapter>,
}

impl Supervisor {
    /// Validates the configuration and checks the executable exists. No
    /// process is started here.
    pub fn new(
        executable: impl Into<PathBuf>,
        config: SupervisorConfig,
    ) -> Result<Self, SupervisorError> {
        let executable = executable.into();
        if !executable.exists() {
            return Err(LaunchError::NotFound { path: executable }.into());
        }
        config.validate()?;
        Ok(Self {
            executable,
            config,
            priority: priority::platform_adapter(),
        })
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Runs the executable under the configured limits. A literal `input`
    /// wins over the configured input file. Returns `Err` only for launch
    /// failures; anything after a successful spawn degrades into the
    /// result's `error` field.
    #[tracing::instrument(skip(self, input), fields(executable = %self.executable.display()))]
    pub async fn run_with_limits(
        &self,
        input: Option<&str>,
    ) -> Result<RunResult, SupervisorError> {
        let payload = match self.resolve_input(input) {
            Ok(payload) => payload,
            Err(message) => {
                warn!(message, "input unavailable, aborting run");
                return Ok(RunResult {
                    error: Some(message),
                    ..Default::default()
                });
            }
        };

        let started = tokio::time::Instant::now();
        let ChildHandle { mut child, pid } = launcher::spawn_child(&self.executable)?;
        let pump = io_pump::start(&mut child, payload);

        if let Err(e) = self.priority.throttle(pid, self.config.max_cpu_percent) {
            warn!(pid, error = %e, "priority adjustment failed");
        }

        info!(
            pid,
            timeout_seconds = self.config.timeout_seconds,
            max_memory_mb = self.config.max_memory_mb,
            max_cpu_percent = self.config.max_cpu_percent,
            "monitoring started"
        );

        let outcome = MonitorLoop::new(&self.config, SysinfoProbe::new(pid))
            .run(&mut child)
            .await;
        let (stdout, stderr) = pump.join().await;
        let execution_time_seconds = started.elapsed().as_secs_f64();

        let exit_code = outcome.exit_status.and_then(|status| status.code());
        let timed_out = outcome.violation == Some(LimitType::Time);
        let memory_exceeded = outcome.violation == Some(LimitType::Memory);
        let cpu_exceeded = outcome.violation == Some(LimitType::Cpu);
        let success = exit_code == Some(0) && !timed_out && !memory_exceeded && !cpu_exceeded;

        let mut result = RunResult {
            success,
            timed_out,
            memory_exceeded,
            cpu_exceeded,
            execution_time_seconds,
            peak_memory_mb: outcome.samples.peak_memory_mb(),
            mean_cpu_percent: outcome.samples.mean_cpu_percent(),
            exit_code,
            stdout,
            stderr,
            error: None,
        };

        if result.success {
            if let Some(path) = &self.config.output_file {
                if let Err(e) = report::write_output_file(path, &result.stdout) {
                    warn!(path = %path.display(), error = %e, "output file write failed");
                    result.error = Some(format!(
                        "failed to write output file {}: {}",
                        path.display(),
                        e
                    ));
                }
            }
        }

        info!(
            success = result.success,
            exit_code = ?result.exit_code,
            execution_time_seconds = result.execution_time_seconds,
            "run finished"
        );
        Ok(result)
    }

    /// Literal input wins; otherwise the configured input file is read.
    /// An unreadable file is a degraded run, reported via the error string.
    fn resolve_input(&self, input: Option<&str>) -> Result<Option<String>, String> {
        if let Some(text) = input {
            return Ok(Some(text.to_string()));
        }
        match &self.config.input_file {
            Some(path) => std::fs::read_to_string(path).map(Some).map_err(|e| {
                format!("failed to read input file {}: {}", path.display(), e)
            }),
            None => Ok(None),
        }
    }
}
