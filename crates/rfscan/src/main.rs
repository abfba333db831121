//! `rfscan` - CLI for the channel scanner
//!
//! This binary wires the configuration, the radio backend, and the scanning
//! loop together, and handles Ctrl-C by stopping the scan cleanly.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, warn};

use rfscan::cli::{self, Cli, Command, ConfigCommand, DetailsCommand, ScanCommand};
use rfscan::radio::open_backend;
use rfscan::{
    init_logging, Config, DataRate, Error, ScanHandle, ScanSettings, Scanner, Transceiver,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = write_failure(&err, &mut io::stdout(), &mut io::stderr());
            ExitCode::FAILURE
        }
    }
}

/// Report a failed command. A radio that fails the init check is reported on
/// stdout with the bare message; everything else goes to stderr.
fn write_failure<O: Write, E: Write>(
    err: &anyhow::Error,
    out: &mut O,
    err_out: &mut E,
) -> io::Result<()> {
    if let Some(Error::RadioNotResponding) = err.downcast_ref::<Error>() {
        writeln!(out, "{err}")
    } else {
        writeln!(err_out, "Error: {err:#}")
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Scan(scan_cmd) => handle_scan(&config, scan_cmd).await,
        Command::Details(details_cmd) => handle_details(&config, &details_cmd),
        Command::Config(config_cmd) => {
            handle_config(&config, config_cmd, &mut io::stdout().lock())
        }
    }
}

async fn handle_scan(config: &Config, cmd: ScanCommand) -> anyhow::Result<()> {
    // print the program's name
    println!(
        "{}",
        std::env::args().next().unwrap_or_else(|| "rfscan".to_string())
    );

    let radio = open_backend(&config.radio, cmd.simulate)?;
    let mut scanner = Scanner::new(radio, ScanSettings::from_config(config));
    prepare_scanner(&mut scanner, &mut io::stdout(), || select_data_rate(config, &cmd))?;

    let handle = ScanHandle::new();
    let stopper = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, stopping scan");
            stopper.stop();
        }
    });

    let limits = cmd.limits();
    let (report, shutdown) = tokio::task::spawn_blocking(move || {
        let mut stdout = io::stdout().lock();
        let report = scanner.run(&mut stdout, &handle, limits);
        (report, scanner.shutdown())
    })
    .await
    .context("scan task panicked")?;

    if let Err(err) = shutdown {
        warn!(error = %err, "failed to power down radio");
    }
    let report = report?;

    if cmd.json {
        println!("{}", report.to_json()?);
    } else if cmd.summary {
        println!();
        println!("{report}");
    }
    Ok(())
}

/// Run the init check, pick the data rate, configure the radio for scanning
/// and print its details.
fn prepare_scanner<R, W, F>(
    scanner: &mut Scanner<R>,
    out: &mut W,
    choose_rate: F,
) -> anyhow::Result<()>
where
    R: Transceiver,
    W: Write,
    F: FnOnce() -> io::Result<DataRate>,
{
    scanner.begin()?;

    let data_rate = choose_rate()?;
    writeln!(out, "Using {data_rate}.")?;
    scanner.set_data_rate(data_rate);
    scanner.apply_settings()?;

    writeln!(out, "{}", scanner.details()?)?;
    Ok(())
}

/// Resolve the data rate: command line, then interactive menu, then config.
fn select_data_rate(config: &Config, cmd: &ScanCommand) -> io::Result<DataRate> {
    if let Some(rate) = cmd.data_rate {
        return Ok(rate.into());
    }
    if io::stdin().is_terminal() {
        return cli::prompt_data_rate(&mut io::stdin().lock(), &mut io::stdout());
    }
    Ok(config.scan.data_rate)
}

fn handle_details(config: &Config, cmd: &DetailsCommand) -> anyhow::Result<()> {
    let radio = open_backend(&config.radio, cmd.simulate)?;
    let mut scanner = Scanner::new(radio, ScanSettings::from_config(config));
    scanner.configure()?;
    let details = scanner.details()?;
    scanner.shutdown()?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&details)?);
    } else {
        println!("{details}");
    }
    Ok(())
}

fn handle_config<W: Write>(
    config: &Config,
    cmd: ConfigCommand,
    stdout: &mut W,
) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                writeln!(stdout, "{}", serde_json::to_string_pretty(config)?)?;
            } else {
                writeln!(stdout, "Current Configuration")?;
                writeln!(stdout, "=====================")?;
                writeln!(stdout)?;
                writeln!(stdout, "[Radio]")?;
                writeln!(stdout, "  SPI device:         {}", config.radio.spi_device.display())?;
                writeln!(stdout, "  SPI speed (Hz):     {}", config.radio.spi_speed_hz)?;
                writeln!(stdout, "  GPIO chip:          {}", config.radio.gpio_chip.display())?;
                writeln!(stdout, "  CE pin:             {}", config.radio.ce_pin)?;
                writeln!(stdout)?;
                writeln!(stdout, "[Scan]")?;
                writeln!(stdout, "  Data rate:          {}", config.scan.data_rate)?;
                writeln!(stdout, "  Channels:           {}", config.scan.num_channels)?;
                writeln!(stdout, "  Passes per line:    {}", config.scan.passes_per_line)?;
                writeln!(stdout, "  Dwell (us):         {}", config.scan.dwell_us)?;
                writeln!(stdout, "  History depth:      {}", config.scan.history_depth)?;
            }
        }
        ConfigCommand::Path => {
            writeln!(stdout, "{}", Config::default_config_path().display())?;
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            writeln!(stdout, "Validating configuration: {}", path.display())?;
            Config::load_from(Some(path.clone()))
                .with_context(|| format!("{} is not a valid configuration", path.display()))?;
            writeln!(stdout, "Configuration is valid.")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfscan::SimulatedRadio;
    use std::path::PathBuf;

    fn scanner(radio: SimulatedRadio) -> Scanner<SimulatedRadio> {
        Scanner::new(radio, ScanSettings::default())
    }

    #[test]
    fn test_prepare_scanner_unresponsive_radio() {
        let mut scanner = scanner(SimulatedRadio::unresponsive());
        let mut out = Vec::new();
        let mut asked = false;

        let err = prepare_scanner(&mut scanner, &mut out, || {
            asked = true;
            Ok(DataRate::Mbps1)
        })
        .unwrap_err();

        assert!(!asked);
        assert!(out.is_empty());

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        write_failure(&err, &mut stdout, &mut stderr).unwrap();
        assert_eq!(
            String::from_utf8(stdout).unwrap(),
            "Radio hardware not responding!\n"
        );
        assert!(stderr.is_empty());
    }

    #[test]
    fn test_prepare_scanner_echoes_rate_and_details() {
        let mut scanner = scanner(SimulatedRadio::new());
        let mut out = Vec::new();

        prepare_scanner(&mut scanner, &mut out, || Ok(DataRate::Kbps250)).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Using 250 kbps.\n"));
        assert!(text.contains("Data Rate\t\t= 250 kbps"));
        assert_eq!(scanner.settings().data_rate, DataRate::Kbps250);
    }

    #[test]
    fn test_write_failure_other_errors_go_to_stderr() {
        let err = anyhow::Error::new(Error::internal("boom"));
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        write_failure(&err, &mut stdout, &mut stderr).unwrap();

        assert!(stdout.is_empty());
        assert!(String::from_utf8(stderr).unwrap().starts_with("Error: "));
    }

    #[test]
    fn test_config_validate_rejects_invalid_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "[scan]\npasses_per_line = 0\n")?;
            let mut out = Vec::new();

            let result = handle_config(
                &Config::default(),
                ConfigCommand::Validate {
                    file: Some(PathBuf::from("bad.toml")),
                },
                &mut out,
            );

            let err = result.expect_err("invalid file must fail");
            assert!(format!("{err:#}").contains("passes_per_line"));
            assert!(!String::from_utf8(out).unwrap().contains("is valid"));
            Ok(())
        });
    }

    #[test]
    fn test_config_validate_accepts_good_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("good.toml", "[scan]\ndata_rate = \"2mbps\"\n")?;
            let mut out = Vec::new();

            handle_config(
                &Config::default(),
                ConfigCommand::Validate {
                    file: Some(PathBuf::from("good.toml")),
                },
                &mut out,
            )
            .map_err(|e| e.to_string())?;

            assert!(String::from_utf8(out)
                .unwrap()
                .contains("Configuration is valid."));
            Ok(())
        });
    }
}
