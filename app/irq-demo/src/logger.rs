use std::{io::Write, time::Instant};

use ansi_rgb::{red, yellow, Foreground};
use elvis_config::LogLevel;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use rgb::{Rgb, RGB8};

fn level_to_rgb(level: Level) -> RGB8 {
    match level {
        Level::Error => red(),
        Level::Warn => yellow(),
        Level::Info => Rgb::new(0x00, 0xBC, 0x12),
        Level::Debug => Rgb::new(0x16, 0x85, 0xA9),
        Level::Trace => Rgb::new(128, 128, 128),
    }
}

fn level_icon(level: Level) -> &'static str {
    match level {
        Level::Error => "💥",
        Level::Warn => "⚠️",
        Level::Info => "💡",
        Level::Debug => "🐛",
        Level::Trace => "🔍",
    }
}

fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Trace => LevelFilter::Trace,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Error => LevelFilter::Error,
    }
}

struct DemoLogger {
    start: Instant,
    level: LevelFilter,
}

impl Log for DemoLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let line = format!(
                "{} {:.3?} [{path}:{line}] {args}",
                level_icon(record.level()),
                self.start.elapsed(),
                path = record.target(),
                line = record.line().unwrap_or(0),
                args = record.args()
            );
            eprintln!("{}", line.fg(level_to_rgb(record.level())));
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Installs the coloured stderr logger.
pub fn init(level: LogLevel) -> Result<(), SetLoggerError> {
    let level = level_filter(level);
    log::set_boxed_logger(Box::new(DemoLogger {
        start: Instant::now(),
        level,
    }))?;
    log::set_max_level(level);
    Ok(())
}
