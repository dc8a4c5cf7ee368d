//! Logger setup.
//!
//! Messages go to the console (stdout for routine output, stderr for
//! warnings and errors) and, when a log directory is given, to a pair of
//! files split the same way. The level comes from the `GRIDBID_LOG_LEVEL`
//! environment variable when set, otherwise from `settings.toml`.
use anyhow::{Result, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

static LOGGER_INSTALLED: OnceLock<()> = OnceLock::new();

/// The level used when neither the environment nor the settings name one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// File receiving info-and-below messages
const LOG_INFO_FILE_NAME: &str = "gridbid_info.log";

/// File receiving warnings and errors
const LOG_ERROR_FILE_NAME: &str = "gridbid_error.log";

fn parse_level(name: &str) -> Result<LevelFilter> {
    Ok(match name.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    })
}

/// Install the global logger.
///
/// `log_level_from_settings` is the level named in `settings.toml`, if any;
/// `GRIDBID_LOG_LEVEL` overrides it. When `log_file_path` is given, log
/// files are written there as well. Calling this a second time is a no-op.
pub fn init(log_level_from_settings: Option<&str>, log_file_path: Option<&Path>) -> Result<()> {
    if LOGGER_INSTALLED.get().is_some() {
        return Ok(());
    }

    let level_name = env::var("GRIDBID_LOG_LEVEL").unwrap_or_else(|_| {
        log_level_from_settings
            .unwrap_or(DEFAULT_LOG_LEVEL)
            .to_string()
    });
    let log_level = parse_level(&level_name)?;

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    // Colour only when writing to a real terminal
    let colour_stdout = std::io::stdout().is_terminal();
    let colour_stderr = std::io::stderr().is_terminal();

    let (info_log_file, err_log_file) = if let Some(log_file_path) = log_file_path {
        let open = |file_name| {
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(log_file_path.join(file_name))
        };
        (
            Some(open(LOG_INFO_FILE_NAME)?),
            Some(open(LOG_ERROR_FILE_NAME)?),
        )
    } else {
        (None, None)
    };

    let mut dispatch = Dispatch::new()
        .chain(
            // Routine messages on stdout
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(move |out, message, record| {
                    format_with_colour(out, message, record, colour_stdout, &colours);
                })
                .level(log_level)
                .chain(std::io::stdout()),
        )
        .chain(
            // Warnings and errors on stderr
            Dispatch::new()
                .format(move |out, message, record| {
                    format_with_colour(out, message, record, colour_stderr, &colours);
                })
                .level(log_level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
        );

    if let Some(info_log_file) = info_log_file {
        dispatch = dispatch.chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(format_plain)
                .level(log_level.max(LevelFilter::Info))
                .chain(info_log_file),
        );
    }

    if let Some(err_log_file) = err_log_file {
        dispatch = dispatch.chain(
            Dispatch::new()
                .format(format_plain)
                .level(LevelFilter::Warn)
                .chain(err_log_file),
        );
    }

    dispatch.apply().expect("Logger already installed");
    LOGGER_INSTALLED.set(()).expect("Logger already installed");

    Ok(())
}

/// The single line format shared by every sink
fn format_entry<T: Display>(out: FormatCallback, level: T, target: &str, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");

    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}

fn format_plain(out: FormatCallback, message: &Arguments, record: &Record) {
    format_entry(out, record.level(), record.target(), message);
}

fn format_with_colour(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    use_colour: bool,
    colours: &ColoredLevelConfig,
) {
    if use_colour {
        format_entry(out, colours.color(record.level()), record.target(), message);
    } else {
        format_plain(out, message, record);
    }
}
