//! Command-line interface for rfscan.
//!
//! This module provides the CLI structure and the interactive prompts used by
//! the `rfscan` binary.

mod commands;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, DataRateArg, DetailsCommand, ScanCommand};

use crate::radio::DataRate;

/// rfscan - Find a quiet 2.4 GHz channel
///
/// Sweeps an nRF24L01 across channels 0-125, counting detected signal energy
/// per channel, and prints a rolling hex histogram. Each output line
/// summarizes 100 sweeps; a column shows the detections on that channel
/// ('-' for none, 'f' for fifteen or more).
#[derive(Debug, Parser)]
#[command(name = "rfscan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan the spectrum and print a rolling histogram
    Scan(ScanCommand),

    /// Configure the radio for scanning and print its settings
    Details(DetailsCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

/// Ask for a data rate on `output` and read the answer from `input`.
///
/// # Errors
///
/// Returns an error if the prompt cannot be written or the answer read.
pub fn prompt_data_rate<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> std::io::Result<DataRate> {
    write!(output, "Select your Data Rate. ")?;
    writeln!(
        output,
        "Enter '1' for 1Mbps, '2' for 2Mbps, '3' for 250kbps. Defaults to 1Mbps."
    )?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(DataRate::from_menu_choice(&answer))
}
