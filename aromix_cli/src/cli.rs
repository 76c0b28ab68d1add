//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "aromix", version, about = "Scent receiver CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/aromix.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the receiver control loop
    Run {
        /// Bound the loop to this many iterations (runs until Ctrl-C when absent)
        #[arg(long, value_name = "N")]
        iterations: Option<usize>,
        /// Poll the transport inline instead of using the background link pump
        #[arg(long, action = ArgAction::SetTrue)]
        direct: bool,
        /// Preload one demo odor command (coffee|alcohol|lemon|mint|lavender|mixed)
        #[arg(long, value_name = "ODOR")]
        demo: Option<String>,
        /// Demo command intensity in percent
        #[arg(long, value_name = "PCT", default_value_t = 50)]
        intensity: u8,
        /// Demo command duration in seconds
        #[arg(long, value_name = "SECS", default_value_t = 5)]
        duration_s: u16,
        /// Print the final status snapshot as a JSON line
        #[arg(long, action = ArgAction::SetTrue)]
        status_json: bool,
    },
    /// List predefined and stored custom recipes
    Recipes,
    /// Quick health check (drives the simulated actuators to all-off)
    SelfCheck,
}
