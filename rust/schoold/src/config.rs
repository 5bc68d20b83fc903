use clap::Parser;
use std::path::PathBuf;

/// Sidecar process for the school administration dashboard. Speaks
/// newline-delimited JSON on stdin/stdout.
#[derive(Debug, Clone, Parser)]
#[command(name = "schoold", version)]
pub struct Config {
    /// Workspace directory to open at start-up.
    #[arg(long, env = "SCHOOLD_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// tracing filter directive; RUST_LOG is used when absent.
    #[arg(long, env = "SCHOOLD_LOG")]
    pub log_filter: Option<String>,

    /// Do not write sample records into empty collections.
    #[arg(long, env = "SCHOOLD_NO_SEED")]
    pub no_seed: bool,
}
