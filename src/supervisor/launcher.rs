use std::path::Path;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::info;

use crate::error::LaunchError;

/// A freshly spawned child with its PID captured at spawn time. The PID stays
/// valid for sampling and signalling until the supervisor reaps the process.
#[derive(Debug)]
pub struct ChildHandle {
    pub child: Child,
    pub pid: u32,
}

/// Starts the executable with all three stdio streams piped. Arguments are
/// never passed through a shell.
pub fn spawn_child(executable: &Path) -> Result<ChildHandle, LaunchError> {
    let mut cmd = Command::new(executable);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let child = cmd.spawn().map_err(|source| LaunchError::Spawn {
        path: executable.to_path_buf(),
        source,
    })?;

    let pid = child.id().ok_or_else(|| LaunchError::Spawn {
        path: executable.to_path_buf(),
        source: std::io::Error::other("process terminated immediately after spawn"),
    })?;

    info!(pid, executable = %executable.display(), "child process started");
    Ok(ChildHandle { child, pid })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawn_refusal_maps_to_spawn_error() {
        // A directory exists but is not executable, so spawn itself fails.
        let dir = std::env::temp_dir();
        let err = spawn_child(&dir).unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
    }
}
