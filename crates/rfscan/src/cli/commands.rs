//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};

use crate::radio::DataRate;
use crate::scanner::RunLimits;

/// Scan command arguments.
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Air data rate (prompts when omitted on a terminal)
    #[arg(short = 'r', long, value_enum)]
    pub data_rate: Option<DataRateArg>,

    /// Stop after this many output lines
    #[arg(short = 'n', long, value_name = "N")]
    pub lines: Option<u64>,

    /// Stop after this many seconds
    #[arg(short, long, value_name = "SECONDS")]
    pub duration: Option<u64>,

    /// Use a simulated radio instead of hardware
    #[arg(long)]
    pub simulate: bool,

    /// Print a channel summary when the scan ends
    #[arg(short, long)]
    pub summary: bool,

    /// Print the end-of-scan summary as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl ScanCommand {
    /// The run limits requested on the command line.
    #[must_use]
    pub fn limits(&self) -> RunLimits {
        RunLimits {
            max_lines: self.lines,
            duration: self.duration.map(Duration::from_secs),
        }
    }
}

/// Details command arguments.
#[derive(Debug, Args)]
pub struct DetailsCommand {
    /// Use a simulated radio instead of hardware
    #[arg(long)]
    pub simulate: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Data rate argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DataRateArg {
    /// 1 Mbps
    #[value(name = "1mbps")]
    Mbps1,
    /// 2 Mbps
    #[value(name = "2mbps")]
    Mbps2,
    /// 250 kbps
    #[value(name = "250kbps")]
    Kbps250,
}

impl From<DataRateArg> for DataRate {
    fn from(arg: DataRateArg) -> Self {
        match arg {
            DataRateArg::Mbps1 => Self::Mbps1,
            DataRateArg::Mbps2 => Self::Mbps2,
            DataRateArg::Kbps250 => Self::Kbps250,
        }
    }
}
