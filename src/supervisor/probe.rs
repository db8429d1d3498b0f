use sysinfo::{Pid, ProcessesToUpdate, System};

/// One reading of the child's resource usage.
///
/// `cpu_percent` follows the per-core convention: 100 is one fully busy
/// logical core, so a multi-threaded child can report more.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSample {
    pub memory_mb: f64,
    pub cpu_percent: f64,
}

#[mockall::automock]
pub trait ResourceProbe: std::fmt::Debug + Send {
    /// Samples the watched process. `None` means the process is gone.
    fn sample(&mut self) -> Option<ResourceSample>;
}

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub struct SysinfoProbe {
    system: System,
    pid: Pid,
}

impl SysinfoProbe {
    pub fn new(pid: u32) -> Self {
        Self {
            system: System::new(),
            pid: Pid::from_u32(pid),
        }
    }
}

impl std::fmt::Debug for SysinfoProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysinfoProbe").field("pid", &self.pid).finish()
    }
}

impl ResourceProbe for SysinfoProbe {
    fn sample(&mut self) -> Option<ResourceSample> {
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);
        let process = self.system.process(self.pid)?;
        Some(ResourceSample {
            memory_mb: process.memory() as f64 / BYTES_PER_MB,
            cpu_percent: process.cpu_usage() as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_reports_own_process() {
        let mut probe = SysinfoProbe::new(std::process::id());
        let sample = probe.sample().expect("own process must be visible");
        assert!(sample.memory_mb > 0.0);
        assert!(sample.cpu_percent >= 0.0);
    }

    #[test]
    fn probe_reports_gone_for_unused_pid() {
        // PIDs near the 32-bit ceiling are above every default pid_max.
        let mut probe = SysinfoProbe::new(u32::MAX - 7);
        assert!(probe.sample().is_none());
    }
}
