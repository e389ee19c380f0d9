//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::{RequestPolicy, TemperatureUnits};
use std::path::PathBuf;

/// Sunshine Sync - weather summary sync between a phone and a watch face
#[derive(Parser, Debug)]
#[command(
    name = "sunshine-sync",
    author,
    version,
    about = "Weather summary synchronization between a primary device and a watch face",
    long_about = "Runs an in-process two-device session: the primary answers update \n\
                  requests from its local forecast store, the companion watch face \n\
                  requests fresh data once and renders it in interactive and ambient mode."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SUNSHINE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SUNSHINE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a two-device sync session
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "sunshine.toml",
        env = "SUNSHINE_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the primary's preferred location
    #[arg(long, env = "SUNSHINE_LOCATION")]
    pub location: Option<String>,

    /// Override temperature units
    #[arg(long, value_enum, env = "SUNSHINE_UNITS")]
    pub units: Option<UnitsArg>,

    /// Override the companion's request policy
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Session length in seconds (0 = until Ctrl+C)
    #[arg(long, default_value = "0", env = "SUNSHINE_DURATION")]
    pub duration: u64,

    /// Toggle ambient mode every N seconds (0 = stay interactive)
    #[arg(long, default_value = "0")]
    pub ambient_every: u64,

    /// Report a low-bit ambient display
    #[arg(long)]
    pub low_bit_ambient: bool,

    /// Validate configuration and exit without running the session
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "SUNSHINE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "sunshine.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "sunshine.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// List seeded forecast rows
    #[arg(long)]
    pub forecasts: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum UnitsArg {
    Metric,
    Imperial,
}

impl From<UnitsArg> for TemperatureUnits {
    fn from(units: UnitsArg) -> Self {
        match units {
            UnitsArg::Metric => TemperatureUnits::Metric,
            UnitsArg::Imperial => TemperatureUnits::Imperial,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PolicyArg {
    /// Request once per watch face lifetime
    OncePerInstance,
    /// Request again after every hide/show cycle
    OncePerActivation,
}

impl From<PolicyArg> for RequestPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::OncePerInstance => RequestPolicy::OncePerInstance,
            PolicyArg::OncePerActivation => RequestPolicy::OncePerActivation,
        }
    }
}
