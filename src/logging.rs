//! Logging configuration for the node registry
//!
//! Uses log4rs with appenders:
//! 1. ConsoleAppender - stderr output, so command output on stdout stays clean
//! 2. RollingFileAppender - log files with rotation

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Max size of a single log file before it rolls over
const LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rolled log files kept
const LOG_FILE_COUNT: u32 = 5;

/// Parse a level name (trace, debug, info, warn, error, off), defaulting to info
pub fn parse_level(level: &str) -> LevelFilter {
    LevelFilter::from_str(level.trim()).unwrap_or(LevelFilter::Info)
}

/// Path of the active log file inside `log_dir`
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join("nodes.1.log")
}

/// Build the log4rs configuration without installing it
///
/// # Log File Configuration
/// - File: `{log_dir}/nodes.1.log`
/// - Max size: 10 MB per file
/// - Max count: 5 files (rotation)
/// - Pattern: `{timestamp} [{level}] {target} - {message}`
pub fn build_config(log_dir: &Path, level: LevelFilter) -> Result<Config, Box<dyn std::error::Error>> {
    // Console appender
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(
            "{d(%H:%M:%S)} [{l}] {t} - {m}{n}",
        )))
        .build();

    // Ensure log directory exists
    std::fs::create_dir_all(log_dir)?;

    let log_file = log_file_path(log_dir);
    let log_pattern = log_dir.join("nodes.{}.log");

    let roller = FixedWindowRoller::builder()
        .base(1)
        .build(&log_pattern.to_string_lossy(), LOG_FILE_COUNT)?;
    let trigger = SizeTrigger::new(LOG_FILE_SIZE);
    let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));

    let logfile = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}",
        )))
        .build(log_file, Box::new(policy))?;

    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console)))
        .appender(Appender::builder().build("logfile", Box::new(logfile)))
        .build(
            Root::builder()
                .appender("console")
                .appender("logfile")
                .build(level),
        )?;

    Ok(config)
}

/// Initialize log4rs with console and rolling file appenders
pub fn init_logger(log_dir: &Path, level: LevelFilter) -> Result<log4rs::Handle, Box<dyn std::error::Error>> {
    let config = build_config(log_dir, level)?;
    Ok(log4rs::init_config(config)?)
}
