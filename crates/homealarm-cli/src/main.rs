use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "homealarm", about = "Home alarm status control")]
pub struct Cli {
    /// SQLite database file. Overrides `database_path` from the config.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    /// TOML config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Show alarm status, arming status and sensors
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Arm the system
    Arm {
        #[arg(value_enum)]
        mode: ArmMode,
    },
    /// Disarm the system and clear any alarm
    Disarm,
    /// Manage sensors
    Sensor {
        #[command(subcommand)]
        command: SensorCmd,
    },
    /// Run a camera frame through the cat detector
    Scan {
        image: PathBuf,
        /// Pin the detector answer instead of the fake random one
        #[arg(long, value_enum)]
        cat: Option<YesNo>,
    },
    /// Show recent alarm status transitions
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCmd,
    },
}

#[derive(Subcommand, Debug)]
pub enum SensorCmd {
    Add {
        name: String,
        #[arg(long, value_enum)]
        kind: Kind,
    },
    Remove { id: String },
    Set {
        id: String,
        #[arg(value_enum)]
        state: Activation,
    },
    List,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCmd {
    /// Write the default config file
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ArmMode { Home, Away }

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Kind { Door, Window, Motion }

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Activation { Active, Inactive }

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum YesNo { Yes, No }

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    commands::run(cli)
}
