use tracing::debug;

/// Advisory scheduling hint applied to the child before polling starts.
/// Failures are reported but never abort the run.
pub trait PriorityAdapter: std::fmt::Debug + Send + Sync {
    fn throttle(&self, pid: u32, max_cpu_percent: f64) -> std::io::Result<()>;
}

pub fn platform_adapter() -> Box<dyn PriorityAdapter> {
    #[cfg(unix)]
    {
        Box::new(NicePriority)
    }
    #[cfg(not(unix))]
    {
        Box::new(NoopPriority)
    }
}

/// Tighter ceilings map to stronger niceness.
#[cfg(unix)]
fn niceness_for(max_cpu_percent: f64) -> i32 {
    if max_cpu_percent < 50.0 {
        10
    } else if max_cpu_percent < 80.0 {
        5
    } else {
        0
    }
}

#[cfg(unix)]
#[derive(Debug)]
struct NicePriority;

#[cfg(unix)]
impl PriorityAdapter for NicePriority {
    fn throttle(&self, pid: u32, max_cpu_percent: f64) -> std::io::Result<()> {
        let niceness = niceness_for(max_cpu_percent);
        if niceness == 0 {
            debug!(pid, "cpu ceiling leaves priority untouched");
            return Ok(());
        }
        let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, pid as libc::id_t, niceness) };
        if rc == -1 {
            return Err(std::io::Error::last_os_error());
        }
        debug!(pid, niceness, "lowered child priority");
        Ok(())
    }
}

#[cfg(not(unix))]
#[derive(Debug)]
struct NoopPriority;

#[cfg(not(unix))]
impl PriorityAdapter for NoopPriority {
    fn throttle(&self, _pid: u32, _max_cpu_percent: f64) -> std::io::Result<()> {
        Ok(())
    }
}
