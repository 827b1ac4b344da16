//! ttymount - container entrypoint that bridges host serial devices.
//!
//! ## Flow
//!
//! 1. Scan the host device directory for serial devices
//! 2. Create matching device nodes inside the sandbox
//! 3. Check read/write access and print a report
//! 4. Publish `DEFAULT_SERIAL_PORT` and `ALL_SERIAL_PORTS`
//! 5. Exec the consumer command with those variables set, or print them as
//!    shell `export` lines when no command is given

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::debug;
use std::env;
use std::path::PathBuf;
use ttymount::{
    DEFAULT_DEV_DIR, DEFAULT_NODE_MODE, DeviceNodeProvisioner, DeviceScanner, ExecHandoff,
    ExportedConfig, Handoff, NativeFs, Pipeline,
};

mod config;
mod report;

use config::Config;

/// ttymount - Provision host serial devices inside a container and launch a consumer.
///
/// Environment variables:
///   TTYMOUNT_DEV_DIR        - Device directory inside the sandbox (default: /dev)
///   TTYMOUNT_HOST_DEV_DIR   - Host device directory to scan (default: dev dir)
///   TTYMOUNT_NO_PROVISION   - Do not create device nodes
///
/// Exported to the consumer:
///   DEFAULT_SERIAL_PORT     - First discovered device, or empty
///   ALL_SERIAL_PORTS        - All discovered devices, comma separated
#[derive(Parser)]
#[command(name = "ttymount")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Exported to the consumer:\n  \
    DEFAULT_SERIAL_PORT  First discovered device, or empty\n  \
    ALL_SERIAL_PORTS     All discovered devices, comma separated\n\n\
    Example: ttymount -- python3 /app/serial_reader.py")]
struct Cli {
    /// Device directory inside the sandbox; exported paths live here.
    #[arg(long, env = "TTYMOUNT_DEV_DIR", value_name = "DIR")]
    dev_dir: Option<PathBuf>,

    /// Host device directory to scan (defaults to --dev-dir).
    #[arg(long, env = "TTYMOUNT_HOST_DEV_DIR", value_name = "DIR")]
    host_dev_dir: Option<PathBuf>,

    /// Extra device name pattern (regex, repeatable), classified as Custom.
    #[arg(long = "pattern", value_name = "REGEX")]
    patterns: Vec<String>,

    /// Do not create device nodes.
    #[arg(
        long,
        env = "TTYMOUNT_NO_PROVISION",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    no_provision: bool,

    /// Permission bits for created nodes, in octal.
    #[arg(long, value_name = "MODE", value_parser = parse_octal_mode)]
    mode: Option<u32>,

    /// Print the report as JSON (stdout, or stderr when a consumer is exec'd).
    #[arg(long)]
    json: bool,

    /// Verbose output level (-v, -vv for increasing detail).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress the device summary and info logs).
    #[arg(short, long)]
    quiet: bool,

    /// Path to a configuration file.
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,

    /// Consumer command to exec after export.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    command: Vec<String>,
}

/// Parse an octal permission mode such as `666`, `0666` or `0o666`.
fn parse_octal_mode(s: &str) -> Result<u32, String> {
    let digits = s.strip_prefix("0o").unwrap_or(s);
    let mode =
        u32::from_str_radix(digits, 8).map_err(|e| format!("invalid octal mode '{s}': {e}"))?;
    if mode > 0o7777 {
        return Err(format!("mode '{s}' is out of range (max 7777)"));
    }
    Ok(mode)
}

/// Effective settings after merging flags, environment and config files.
#[derive(Debug)]
struct Settings {
    dev_dir: PathBuf,
    host_dev_dir: PathBuf,
    patterns: Vec<String>,
    provision: bool,
    mode: u32,
    command: Vec<String>,
}

impl Settings {
    fn resolve(cli: &Cli, config: Config) -> Self {
        let dev_dir = cli
            .dev_dir
            .clone()
            .or(config.scan.dev_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DEV_DIR));
        let host_dev_dir = cli
            .host_dev_dir
            .clone()
            .or(config.scan.host_dev_dir)
            .unwrap_or_else(|| dev_dir.clone());

        let mut patterns = config.scan.extra_patterns;
        patterns.extend(cli.patterns.iter().cloned());

        let command = if cli.command.is_empty() {
            config.handoff.command
        } else {
            cli.command.clone()
        };

        Self {
            dev_dir,
            host_dev_dir,
            patterns,
            provision: !cli.no_provision && config.provision.enabled.unwrap_or(true),
            mode: cli
                .mode
                .or(config.provision.mode)
                .unwrap_or(DEFAULT_NODE_MODE),
            command,
        }
    }
}

/// Handoff used when no consumer command is configured.
struct PrintHandoff {
    emit: bool,
}

impl Handoff for PrintHandoff {
    fn hand_off(&mut self, exported: &ExportedConfig) -> ttymount::Result<()> {
        if self.emit {
            print!("{}", exported.to_shell());
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    // --- NO_COLOR and TTY detection ---
    let stderr_is_tty = console::Term::stderr().is_term();
    if env::var("NO_COLOR").is_ok() || !stderr_is_tty {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_target(cli.verbose >= 2)
        .format_timestamp(if cli.verbose >= 2 {
            Some(env_logger::TimestampPrecision::Millis)
        } else {
            None
        })
        .init();

    debug!(
        "ttymount v{} (verbose level: {})",
        env!("CARGO_PKG_VERSION"),
        cli.verbose
    );

    // Load configuration
    let config = if let Some(ref path) = cli.config_path {
        Config::load_from_path(path)
    } else {
        Config::load()
    };
    let settings = Settings::resolve(&cli, config);
    debug!("Effective settings: {settings:?}");

    let scanner = DeviceScanner::new(&settings.host_dev_dir, &settings.dev_dir)?
        .with_extra_patterns(&settings.patterns)
        .context("Invalid device pattern")?;
    let provisioner = DeviceNodeProvisioner::new()
        .with_mode(settings.mode)
        .enabled(settings.provision);

    let prepared = Pipeline::new(scanner, NativeFs)
        .with_provisioner(provisioner)
        .run();

    let usb = ttymount::usb_details();
    if cli.json {
        let json = serde_json::to_string_pretty(&report::to_json(prepared.report(), &usb))?;
        // stdout belongs to the consumer once it is exec'd.
        if settings.command.is_empty() {
            println!("{json}");
        } else {
            eprintln!("{json}");
        }
    } else if !cli.quiet {
        report::print_summary(prepared.report(), &usb);
    }

    if settings.command.is_empty() {
        prepared.hand_off(&mut PrintHandoff { emit: !cli.json })?;
        return Ok(());
    }

    let mut consumer = ExecHandoff::new(settings.command);
    prepared
        .hand_off(&mut consumer)
        .context("Failed to launch the consumer")?;

    Ok(())
}
