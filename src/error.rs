use std::path::PathBuf;

/// Configuration failures. Always fatal, raised before any process exists.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("config field `{field}` must be positive, got {value}")]
    InvalidValue { field: &'static str, value: f64 },
}

/// Launch failures. Always fatal, raised before monitoring starts.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("executable not found: {path}")]
    NotFound { path: PathBuf },
    #[error("failed to start {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level error for the library and CLI boundary. Anything that happens
/// after a successful launch degrades into `RunResult::error` instead.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Launch(#[from] LaunchError),
}
