use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use proclimit::{ConfigOverrides, RunReport, Supervisor, SupervisorConfig};

/// Run an executable under wall-clock, memory, and CPU limits.
#[derive(Debug, Parser)]
#[command(name = "proclimit", version, about)]
struct Cli {
    /// Executable to supervise
    executable: PathBuf,

    /// JSON file with limit overrides
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// File fed to the child's stdin
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,

    /// File the captured stdout is written to on success
    #[arg(short = 'O', long = "output-file")]
    output_file: Option<PathBuf>,

    /// Write the full run report as JSON to this path
    #[arg(short = 'o', long = "report")]
    report: Option<PathBuf>,

    /// Wall-clock timeout in seconds
    #[arg(short = 't', long = "timeout")]
    timeout: Option<f64>,

    /// Resident memory ceiling in MB
    #[arg(short = 'm', long = "memory")]
    memory: Option<f64>,

    /// CPU ceiling in percent of one core
    #[arg(long = "cpu")]
    cpu: Option<f64>,

    /// Sampling interval in seconds
    #[arg(long = "check-interval")]
    check_interval: Option<f64>,
}

#[tokio::main]
#[tracing::instrument]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    set_panic_hook();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let overrides = ConfigOverrides {
        timeout_seconds: cli.timeout,
        max_memory_mb: cli.memory,
        max_cpu_percent: cli.cpu,
        input_file: cli.input,
        output_file: cli.output_file,
        check_interval: cli.check_interval,
    };
    let config = SupervisorConfig::resolve(cli.config.as_deref(), overrides)?;

    let supervisor = Supervisor::new(cli.executable, config)?;
    let result = supervisor.run_with_limits(None).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(path) = cli.report {
        let report = RunReport::new(
            supervisor.executable(),
            supervisor.config().clone(),
            result.clone(),
        );
        report.save(&path)?;
        tracing::info!(path = %path.display(), "report written");
    }

    Ok(result.success)
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
