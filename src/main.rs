//! # buzzer-freq
//!
//! Publishes a buzzer frequency into shared memory, or watches the value an
//! external controller will pick up.
//!
//! # Usage
//!
//! ```bash
//! # Publish once
//! buzzer-freq publish 1000
//!
//! # Print every change, like the buzzer controller does
//! buzzer-freq watch
//!
//! # Entry form (built with --features gui)
//! buzzer-freq gui
//! ```

use buzzer_shm::config::{AppConfig, ConfigError, ConfigLoader, LogLevel};
use buzzer_shm::tone::{parse_frequency, PwmSettings};
use buzzer_shm::{ChannelConfig, FrequencyReader, Publisher};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Buzzer frequency publisher
#[derive(Parser, Debug)]
#[command(name = "buzzer-freq")]
#[command(version)]
#[command(about = "Publish a buzzer frequency through POSIX shared memory")]
#[command(long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Shared memory name (overrides the config file)
    #[arg(long)]
    name: Option<String>,

    /// Shared memory size in bytes (overrides the config file)
    #[arg(long)]
    size: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Publish a single value and exit
    Publish {
        /// Value to publish; surrounding whitespace is trimmed
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Print the current value once
    Read,

    /// Print the value every time it changes, until Ctrl+C
    Watch {
        /// Polling interval in milliseconds
        #[arg(long, default_value = "100")]
        interval_ms: u64,
    },

    /// Open the frequency entry form
    #[cfg(feature = "gui")]
    Gui,
}

fn main() {
    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args);
    setup_tracing(
        &args,
        config.as_ref().map(|c| c.log_level).unwrap_or_default(),
    );
    let config = config?;
    config.validate()?;

    debug!(name = %config.channel.name, size = config.channel.size, "using channel");

    match args.command {
        Command::Publish { value } => publish(&config.channel, &value)?,
        Command::Read => {
            let reader = FrequencyReader::open(&config.channel.name)?;
            println!("{}", reader.read_value());
        }
        Command::Watch { interval_ms } => {
            watch(&config.channel, Duration::from_millis(interval_ms))?
        }
        #[cfg(feature = "gui")]
        Command::Gui => {
            let publisher = Publisher::from_config(&config.channel)?;
            buzzer_shm::gui::run(publisher)?;
        }
    }

    info!("shutdown complete");
    Ok(())
}

fn load_config(args: &Args) -> Result<AppConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    if let Some(name) = &args.name {
        config.channel.name = name.clone();
    }
    if let Some(size) = args.size {
        config.channel.size = size;
    }
    Ok(config)
}

fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        configured.into()
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn publish(channel: &ChannelConfig, value: &str) -> buzzer_shm::Result<()> {
    let mut publisher = Publisher::from_config(channel)?;
    publisher.publish(value)?;

    let value = value.trim();
    match parse_frequency(value) {
        Some(freq) => info!(freq, "frequency published"),
        None => warn!(value, "published value is not a frequency the controller can use"),
    }
    Ok(())
}

fn watch(channel: &ChannelConfig, interval: Duration) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = FrequencyReader::open(&channel.name)?;
    let pwm = PwmSettings::default();

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })?;

    info!(name = reader.name(), "watching for frequency changes");

    while running.load(Ordering::SeqCst) {
        if let Some(value) = reader.poll_changed() {
            match parse_frequency(&value) {
                Some(freq) => println!(
                    "Frequency is {} Hz (PWM clock divisor {})",
                    freq,
                    pwm.clock_divisor(freq)
                ),
                None => println!("Frequency is {:?} (not a number)", value),
            }
        }
        std::thread::sleep(interval);
    }

    info!("received shutdown signal");
    Ok(())
}
