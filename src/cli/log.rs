//! Logging setup for the command line tool.
//!
//! Library code logs through the `log` facade; this installs a `fern`
//! dispatcher writing to stderr. The global level comes from the number of
//! `-v` flags, and `--log target[=level]` refines it per module.

use colored::*;
use log::{Level, LevelFilter};
use std::str::FromStr;
use time::macros::format_description;
use time::OffsetDateTime;

fn verbosity_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Parse a `target[=level]` component. A bare target logs everything.
fn parse_component(spec: &str) -> Result<(String, LevelFilter), String> {
    match spec.split_once('=') {
        Some((target, level)) => {
            let level = LevelFilter::from_str(level.trim())
                .map_err(|_| format!("Invalid log level '{}' for '{}'", level, target))?;
            Ok((target.trim().to_string(), level))
        }
        None => Ok((spec.to_string(), LevelFilter::Trace)),
    }
}

fn colored_level(level: Level) -> ColoredString {
    match level {
        Level::Error => "ERROR".bright_red(),
        Level::Warn => "WARN".yellow(),
        Level::Info => "INFO".green(),
        Level::Debug => "DEBUG".blue(),
        Level::Trace => "TRACE".bright_black(),
    }
}

pub fn setup(verbose: u8, components: Vec<&str>, log_time: bool) -> Result<(), String> {
    let mut dispatch = fern::Dispatch::new().level(verbosity_level(verbose));
    for spec in components {
        let (target, level) = parse_component(spec)?;
        dispatch = dispatch.level_for(target, level);
    }

    let time_format = format_description!("[hour]:[minute]:[second].[subsecond digits:3]");
    dispatch
        .format(move |out, message, record| {
            let level = colored_level(record.level());
            if log_time {
                let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
                let stamp = now.format(&time_format).unwrap_or_default();
                out.finish(format_args!(
                    "{} {} [{}] {}",
                    stamp.as_str().dimmed(),
                    level,
                    record.target(),
                    message
                ))
            } else {
                out.finish(format_args!("{} [{}] {}", level, record.target(), message))
            }
        })
        .chain(std::io::stderr())
        .apply()
        .map_err(|e| format!("Failed to set up logging: {}", e))
}

// =============================================================================
// Unit Tests
// =============================================================================
