// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::app_config::{Config, LogLevel};
use app_controller::Controller;

mod app_config;
mod app_controller;
mod errors;
mod job_coordinator;
mod language_utils;
mod media;
mod object_store;
mod providers;
mod stats;
mod subtitle_processor;
mod transcription;
mod translation;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Claim and process unclaimed videos until none remain (default command)
    #[command(alias = "run")]
    Work(WorkArgs),

    /// Generate shell completions for vidscribe
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct WorkArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Object store root directory
    #[arg(long, env = "STORE_ROOT")]
    store_root: Option<PathBuf>,

    /// Prefix holding input media objects
    #[arg(long, env = "INPUT_PREFIX")]
    input_prefix: Option<String>,

    /// Prefix receiving output subtitle tracks
    #[arg(long, env = "OUTPUT_PREFIX")]
    output_prefix: Option<String>,

    /// Prefix holding the claim catalog and statistics
    #[arg(long, env = "METADATA_PREFIX")]
    metadata_prefix: Option<String>,

    /// Target language codes, comma separated (e.g. 'en,he')
    #[arg(short, long, value_delimiter = ',')]
    target_languages: Option<Vec<String>>,

    /// Audio window length in seconds
    #[arg(short, long)]
    window_seconds: Option<u64>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// vidscribe - Batch Video Transcription Worker
///
/// Claims unprocessed videos from a shared object store, transcribes them
/// through a chunked speech recognition pipeline and produces subtitle
/// tracks in multiple languages.
#[derive(Parser, Debug)]
#[command(name = "vidscribe")]
#[command(version = "1.0.0")]
#[command(about = "Coordinated batch video transcription and subtitle translation")]
#[command(long_about = "vidscribe claims unprocessed videos from a shared object store and drives \
each one through audio extraction, chunked speech recognition and multilingual \
subtitle generation. Multiple workers may run against the same store; a lock \
object in the metadata prefix keeps their claims exclusive.

EXAMPLES:
    vidscribe                                   # Process using default config
    vidscribe --store-root /mnt/media           # Use a specific store root
    vidscribe -t en,he,fr                       # Translate into three languages
    vidscribe -w 30 --log-level debug           # 30s windows with debug logging
    vidscribe completions bash > vidscribe.bash # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default
    one will be created automatically. Store prefixes can also be set through
    the STORE_ROOT, INPUT_PREFIX, OUTPUT_PREFIX and METADATA_PREFIX environment
    variables.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    work: WorkArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::get_color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "vidscribe", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Work(args)) => run_worker(args).await,
        None => run_worker(cli.work).await,
    }
}

async fn run_worker(options: WorkArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter(&config_log_level));
    }

    // Load or create configuration
    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        let config = Config::default();
        config
            .save_to_file(config_path)
            .with_context(|| format!("Failed to create default config at {}", config_path))?;
        info!("Created default configuration at {}", config_path);
        config
    };

    // Override config with CLI options if provided
    if let Some(store_root) = options.store_root {
        config.store_root = store_root;
    }
    if let Some(input_prefix) = options.input_prefix {
        config.input_prefix = input_prefix;
    }
    if let Some(output_prefix) = options.output_prefix {
        config.output_prefix = output_prefix;
    }
    if let Some(metadata_prefix) = options.metadata_prefix {
        config.metadata_prefix = metadata_prefix;
    }
    if let Some(target_languages) = options.target_languages {
        config.target_languages = target_languages;
    }
    if let Some(window_seconds) = options.window_seconds {
        config.window_seconds = window_seconds;
    }
    if let Some(cmd_log_level) = options.log_level {
        config.log_level = cmd_log_level.into();
    }
    log::set_max_level(level_filter(&config.log_level));
    config.validate()?;

    info!("Video Transcription System Starting...");
    info!("Store root: {:?}", config.store_root);
    info!("Input prefix: {}", config.input_prefix);
    info!("Output prefix: {}", config.output_prefix);

    let start_time = Instant::now();
    let controller = Controller::with_config(config)?;
    let summary = controller.run().await?;

    info!(
        "Processed {}/{} videos ({} succeeded)",
        summary.processed, summary.candidates, summary.succeeded
    );
    info!("Total runtime: {}", format_duration(start_time.elapsed()));

    Ok(())
}

fn level_filter(level: &LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

fn format_duration(duration: std::time::Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
