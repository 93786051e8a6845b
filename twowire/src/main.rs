//! TwoWire - Entry Point
//!
//! Probes for an ISM330DHCX IMU on the host's I2C backend and streams its
//! accelerometer and gyroscope output.
//!
//! ```text
//! twowire --probe [--device=/dev/i2c-1]
//! twowire --stream [--samples=100] [--interval-ms=50] [--burst] [--address=0x6a]
//! twowire --version
//! ```

use std::collections::HashMap;
use std::env;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use tracing::{error, info, warn};

use twowire::logs::{init_logging, LogLevel, LogOptions};
use twowire::sensor::ism330dhcx::{self, ReadMode, SensorConfig};
use twowire::utils::{parse_address, version_info};
use twowire::{Settings, TwoWire};

/// Let the sensor start producing data after configuration
const STARTUP_DELAY: Duration = Duration::from_millis(500);

/// Give up streaming after this many failed reads in a row
const MAX_CONSECUTIVE_FAILURES: u32 = 10;

fn main() -> ExitCode {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Failed to serialize version info: {e}"),
        }
        return ExitCode::SUCCESS;
    }

    let settings = match load_settings(&cli_args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            return ExitCode::FAILURE;
        }
    };

    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        json_format: cli_args.contains_key("json-logs"),
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let result = if cli_args.contains_key("stream") {
        stream(&settings, &cli_args)
    } else if cli_args.contains_key("probe") {
        probe(&settings, &cli_args)
    } else {
        print_usage();
        Ok(())
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("twowire: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!("{}", "twowire - TwoWire I2C probe".bold());
    println!();
    println!("  --probe                 look for an ISM330DHCX at 0x6a/0x6b");
    println!("  --stream                configure the sensor and print samples");
    println!("    --samples=N           stop after N samples (default: run until interrupted)");
    println!("    --interval-ms=M       delay between samples (default: 50)");
    println!("    --burst               read each axis block with one six-byte transfer");
    println!("    --address=ADDR        skip probing and use this address");
    println!("  --config=PATH           settings JSON file");
    println!("  --device=PATH           i2c-dev node (Linux)");
    println!("  --library=PATH          CH341 driver DLL (Windows)");
    println!("  --log-level=LEVEL       trace|debug|info|warn|error");
    println!("  --json-logs             emit logs as JSON");
    println!("  --version               print build information");
}

fn load_settings(cli_args: &HashMap<String, String>) -> anyhow::Result<Settings> {
    let mut settings = match cli_args.get("config") {
        Some(path) => Settings::load(path).with_context(|| format!("loading {path}"))?,
        None => Settings::default(),
    };

    if let Some(device) = cli_args.get("device") {
        settings.stream.device_path = device.clone();
    }
    if let Some(library) = cli_args.get("library") {
        settings.register.library_path = library.clone();
    }
    if let Some(level) = cli_args.get("log-level") {
        settings.log_level = level.parse::<LogLevel>().map_err(|e| anyhow!(e))?;
    }

    Ok(settings)
}

fn parse_number<T: std::str::FromStr>(
    cli_args: &HashMap<String, String>,
    key: &str,
    default: T,
) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match cli_args.get(key) {
        Some(value) => value
            .parse()
            .map_err(|e| anyhow!("Invalid --{key}={value}: {e}")),
        None => Ok(default),
    }
}

fn open_wire(settings: &Settings) -> anyhow::Result<TwoWire> {
    let mut wire = TwoWire::for_host(settings)?;
    wire.try_begin().context("Failed to initialize I2C interface")?;
    Ok(wire)
}

fn find_sensor(wire: &mut TwoWire, cli_args: &HashMap<String, String>) -> anyhow::Result<u8> {
    if let Some(address) = cli_args.get("address") {
        let address = parse_address(address).map_err(|e| anyhow!(e))?;
        ism330dhcx::verify_identity(wire, address)?;
        return Ok(address);
    }

    ism330dhcx::probe(
        wire,
        &[ism330dhcx::ADDRESS_LOW, ism330dhcx::ADDRESS_HIGH],
    )
    .ok_or_else(|| anyhow!("No ISM330DHCX sensor found at 0x6a or 0x6b"))
}

fn probe(settings: &Settings, cli_args: &HashMap<String, String>) -> anyhow::Result<()> {
    let mut wire = open_wire(settings)?;
    let result = find_sensor(&mut wire, cli_args);
    wire.end();

    let address = result?;
    println!(
        "{} ISM330DHCX at 0x{:02x}",
        "found".green().bold(),
        address
    );
    Ok(())
}

fn stream(settings: &Settings, cli_args: &HashMap<String, String>) -> anyhow::Result<()> {
    let samples: u64 = parse_number(cli_args, "samples", 0)?;
    let interval = Duration::from_millis(parse_number(cli_args, "interval-ms", 50)?);
    let mode = if cli_args.contains_key("burst") {
        ReadMode::Burst
    } else {
        ReadMode::PerRegister
    };

    let mut wire = open_wire(settings)?;
    let address = find_sensor(&mut wire, cli_args)?;

    let config = SensorConfig::default();
    ism330dhcx::configure(&mut wire, address, &config)?;
    thread::sleep(STARTUP_DELAY);

    println!(
        "{}",
        format!("Streaming ISM330DHCX at 0x{address:02x} ({mode:?})").bold()
    );

    let start = Instant::now();
    let mut count: u64 = 0;
    let mut failures: u64 = 0;
    let mut consecutive_failures: u32 = 0;
    while samples == 0 || count < samples {
        match ism330dhcx::read_sample(&mut wire, address, mode) {
            Ok(raw) => {
                count += 1;
                consecutive_failures = 0;
                let a = raw.accel_g(&config);
                let g = raw.gyro_dps(&config);
                let rate = count as f64 / start.elapsed().as_secs_f64().max(f64::EPSILON);
                println!(
                    "Accel: X={:+7.3}g Y={:+7.3}g Z={:+7.3}g | Gyro: X={:+8.2}dps Y={:+8.2}dps Z={:+8.2}dps | {:5.1}Hz #{}",
                    a[0], a[1], a[2], g[0], g[1], g[2], rate, count
                );
            }
            Err(e) => {
                failures += 1;
                consecutive_failures += 1;
                warn!("Sample read failed: {e}");
                if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    wire.end();
                    bail!("Sensor stopped answering: {e}");
                }
            }
        }
        thread::sleep(interval);
    }

    wire.end();
    info!(
        "Streamed {} samples in {:.1}s ({} failed reads)",
        count,
        start.elapsed().as_secs_f64(),
        failures
    );
    Ok(())
}
