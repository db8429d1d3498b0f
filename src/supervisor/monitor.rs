use std::process::ExitStatus;

use tokio::process::Child;
use tokio::time::{Duration, Instant, sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::SupervisorConfig;
use crate::supervisor::probe::ResourceProbe;

/// How long a terminated child gets to exit cleanly before the hard kill.
const TERMINATION_GRACE: Duration = Duration::from_secs(2);

/// Instantaneous CPU readings overshoot under scheduler jitter; only samples
/// beyond ceiling x factor count as strikes.
const CPU_TOLERANCE_FACTOR: f64 = 1.5;

/// Which bound the child violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitType {
    Time,
    Memory,
    Cpu,
}

/// Readings accumulated over the run, keyed by elapsed seconds. Owned by the
/// monitor loop alone; read once at the end for the summary numbers.
#[derive(Debug, Default)]
pub struct SampleSeries {
    memory: Vec<(f64, f64)>,
    cpu: Vec<(f64, f64)>,
}

impl SampleSeries {
    fn record_memory(&mut self, elapsed: f64, memory_mb: f64) {
        self.memory.push((elapsed, memory_mb));
    }

    fn record_cpu(&mut self, elapsed: f64, cpu_percent: f64) {
        self.cpu.push((elapsed, cpu_percent));
    }

    pub fn peak_memory_mb(&self) -> f64 {
        self.memory.iter().fold(0.0, |peak, &(_, mb)| peak.max(mb))
    }

    pub fn mean_cpu_percent(&self) -> f64 {
        if self.cpu.is_empty() {
            return 0.0;
        }
        let total: f64 = self.cpu.iter().map(|&(_, pct)| pct).sum();
        total / self.cpu.len() as f64
    }
}

/// What a single monitor tick decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tick {
    Continue,
    Exited,
    Violation(LimitType),
}

/// How the watched run ended.
#[derive(Debug)]
pub struct MonitorOutcome {
    pub violation: Option<LimitType>,
    pub exit_status: Option<ExitStatus>,
    pub samples: SampleSeries,
}

/// Polls the child at a fixed interval and enforces the configured bounds.
/// The transition logic lives in `evaluate` so it can run against a scripted
/// probe without a real process.
#[derive(Debug)]
pub struct MonitorLoop<P: ResourceProbe> {
    probe: P,
    timeout_seconds: f64,
    max_memory_mb: f64,
    cpu_ceiling: f64,
    cpu_strike_limit: u32,
    cpu_strikes: u32,
    check_interval: Duration,
    samples: SampleSeries,
}

impl<P: ResourceProbe> MonitorLoop<P> {
    pub fn new(config: &SupervisorConfig, probe: P) -> Self {
        Self {
            probe,
            timeout_seconds: config.timeout_seconds,
            max_memory_mb: config.max_memory_mb,
            cpu_ceiling: config.max_cpu_percent * CPU_TOLERANCE_FACTOR,
            cpu_strike_limit: config.cpu_strike_limit(),
            cpu_strikes: 0,
            check_interval: Duration::from_secs_f64(config.check_interval),
            samples: SampleSeries::default(),
        }
    }

    /// One polling step at `elapsed` seconds into the run. Timeout is checked
    /// before sampling; a vanished process reads as a normal exit.
    fn evaluate(&mut self, elapsed: f64) -> Tick {
        if elapsed > self.timeout_seconds {
            info!(elapsed, limit = self.timeout_seconds, "timeout exceeded");
            return Tick::Violation(LimitType::Time);
        }

        let Some(sample) = self.probe.sample() else {
            debug!(elapsed, "process gone during sampling");
            return Tick::Exited;
        };

        self.samples.record_memory(elapsed, sample.memory_mb);
        // A zero reading is the sampler warming up, not an idle child.
        if sample.cpu_percent > 0.0 {
            self.samples.record_cpu(elapsed, sample.cpu_percent);
        }

        if sample.memory_mb > self.max_memory_mb {
            info!(
                memory_mb = sample.memory_mb,
                limit_mb = self.max_memory_mb,
                "memory limit exceeded"
            );
            return Tick::Violation(LimitType::Memory);
        }

        if sample.cpu_percent > self.cpu_ceiling {
            self.cpu_strikes += 1;
            debug!(
                cpu_percent = sample.cpu_percent,
                strikes = self.cpu_strikes,
                "cpu sample above tolerance"
            );
            if self.cpu_strikes >= self.cpu_strike_limit {
                info!(
                    cpu_percent = sample.cpu_percent,
                    strikes = self.cpu_strikes,
                    "cpu limit exceeded"
                );
                return Tick::Violation(LimitType::Cpu);
            }
        } else {
            self.cpu_strikes = 0;
        }

        Tick::Continue
    }

    /// Drives the polling loop until the child exits or violates a bound.
    /// On violation the child is terminated before returning.
    pub async fn run(mut self, child: &mut Child) -> MonitorOutcome {
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    return MonitorOutcome {
                        violation: None,
                        exit_status: Some(status),
                        samples: self.samples,
                    };
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "try_wait failed, treating child as exited");
                    return MonitorOutcome {
                        violation: None,
                        exit_status: None,
                        samples: self.samples,
                    };
                }
            }

            let elapsed = started.elapsed().as_secs_f64();
            match self.evaluate(elapsed) {
                Tick::Continue => {}
                Tick::Exited => {
                    let exit_status = child.try_wait().ok().flatten();
                    return MonitorOutcome {
                        violation: None,
                        exit_status,
                        samples: self.samples,
                    };
                }
                Tick::Violation(limit) => {
                    let exit_status = terminate(child).await;
                    return MonitorOutcome {
                        violation: Some(limit),
                        exit_status,
                        samples: self.samples,
                    };
                }
            }

            sleep(self.check_interval).await;
        }
    }
}

/// Polite stop, bounded grace, then hard kill. Returns the exit status when
/// the child could be reaped.
async fn terminate(child: &mut Child) -> Option<ExitStatus> {
    request_terminate(child);

    match timeout(TERMINATION_GRACE, child.wait()).await {
        Ok(Ok(status)) => return Some(status),
        Ok(Err(e)) => {
            warn!(error = %e, "waiting for terminated child failed");
            return None;
        }
        Err(_) => {
            warn!("child ignored termination request, killing");
        }
    }

    if let Err(e) = child.kill().await {
        warn!(error = %e, "kill failed");
    }
    child.try_wait().ok().flatten()
}

#[cfg(unix)]
fn request_terminate(child: &mut Child) {
    match child.id() {
        Some(pid) => {
            let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
            if rc == -1 {
                warn!(
                    pid,
                    error = %std::io::Error::last_os_error(),
                    "SIGTERM failed"
                );
            }
        }
        None => {
            let _ = child.start_kill();
        }
    }
}

#[cfg(not(unix))]
fn request_terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        warn!(error = %e, "termination request failed");
    }
}
