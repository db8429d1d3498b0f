use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::SupervisorConfig;

/// Outcome of one supervised run. Produced once the child is reaped and the
/// I/O tasks are joined; never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub success: bool,
    pub timed_out: bool,
    pub memory_exceeded: bool,
    pub cpu_exceeded: bool,
    pub execution_time_seconds: f64,
    pub peak_memory_mb: f64,
    pub mean_cpu_percent: f64,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub error: Option<String>,
}

/// Persisted run record: the result together with the configuration that
/// produced it and a creation timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub timestamp: String,
    pub executable: String,
    pub config: SupervisorConfig,
    pub results: RunResult,
}

impl RunReport {
    pub fn new(executable: &Path, config: SupervisorConfig, results: RunResult) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            executable: executable.display().to_string(),
            config,
            results,
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}

/// Writes the captured stdout to the configured output file, overwriting any
/// previous contents.
pub fn write_output_file(path: &Path, stdout: &str) -> std::io::Result<()> {
    std::fs::write(path, stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_result_json_round_trip_is_lossless() {
        let result = RunResult {
            success: false,
            timed_out: true,
            memory_exceeded: false,
            cpu_exceeded: false,
            execution_time_seconds: 1.234,
            peak_memory_mb: 17.5,
            mean_cpu_percent: 42.0,
            exit_code: None,
            stdout: "line one\nline two\n".to_string(),
            stderr: "warning\n".to_string(),
            error: Some("terminated after timeout".to_string()),
        };

        let json = serde_json::to_string(&result).unwrap();
        let restored: RunResult = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, result);
    }

    #[test]
    fn report_save_writes_pretty_json_with_metadata() {
        let report = RunReport::new(
            Path::new("/bin/echo"),
            SupervisorConfig::default(),
            RunResult {
                success: true,
                exit_code: Some(0),
                ..Default::default()
            },
        );
        let path = std::env::temp_dir().join(format!(
            "proclimit_report_{}.json",
            uuid::Uuid::new_v4()
        ));
        report.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let restored: RunReport = serde_json::from_str(&text).unwrap();
        assert_eq!(restored.executable, "/bin/echo");
        assert_eq!(restored.results.exit_code, Some(0));
        assert!(restored.timestamp.contains('T'));
    }
}
