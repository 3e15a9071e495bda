use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record};
use time::macros::format_description;
use time::OffsetDateTime;

pub enum LogOutput {
    Stdout,
    Stderr,
}

/// `log` backend writing colored lines to a terminal stream and,
/// optionally, plain lines to a file
pub struct Logger {
    severity: Level,
    output: Option<LogOutput>,
    file: Option<Mutex<File>>,
    enable_colors: bool,
}

impl Logger {
    pub fn new(
        severity: Level,
        output: Option<LogOutput>,
        file_path: Option<PathBuf>,
        enable_colors: bool,
    ) -> Self {
        let file = file_path.and_then(|path| {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| eprintln!("cannot open log file {}: {}", path.display(), e))
                .ok()
                .map(Mutex::new)
        });

        Self { severity, output, file, enable_colors }
    }

    /// Install a logger configured from the environment.
    ///
    /// `REALMS_LOG` (falling back to `RUST_LOG`) sets the level,
    /// `REALMS_LOG_FILE` enables file output at the given path and
    /// `NO_COLOR` disables ANSI colors.
    pub fn init() -> Result<(), log::SetLoggerError> {
        let severity = std::env::var("REALMS_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .ok()
            .and_then(|v| v.parse::<Level>().ok())
            .unwrap_or(Level::Info);
        let file_path = std::env::var_os("REALMS_LOG_FILE").map(PathBuf::from);
        let enable_colors = std::env::var_os("NO_COLOR").is_none();

        let logger = Logger::new(severity, Some(LogOutput::Stderr), file_path, enable_colors);
        log::set_max_level(LevelFilter::Trace);
        log::set_boxed_logger(Box::new(logger))
    }

    fn timestamp() -> String {
        OffsetDateTime::now_utc()
            .format(format_description!("[hour]:[minute]:[second]"))
            .unwrap_or_default()
    }

    fn color(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[36m",
            Level::Debug => "\x1b[35m",
            Level::Trace => "\x1b[37m",
        }
    }

    fn format_line(&self, record: &Record, colored: bool) -> String {
        let timestamp = Self::timestamp();
        let level = record.level().as_str();
        if colored {
            format!(
                "{}[{}] {:<5}\x1b[0m {}: {}",
                Self::color(record.level()),
                timestamp,
                level,
                record.target(),
                record.args()
            )
        } else {
            format!("[{}] {:<5} {}: {}", timestamp, level, record.target(), record.args())
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.severity
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if let Some(output) = &self.output {
            let line = self.format_line(record, self.enable_colors);
            let _ = match output {
                LogOutput::Stdout => writeln!(std::io::stdout(), "{line}"),
                LogOutput::Stderr => writeln!(std::io::stderr(), "{line}"),
            };
        }

        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = writeln!(file, "{}", self.format_line(record, false));
            }
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_plain_lines_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/realms.log");
        let logger = Logger::new(Level::Info, None, Some(path.clone()), true);

        logger.log(
            &Record::builder()
                .level(Level::Info)
                .target("realms::registry")
                .args(format_args!("discovered {}", 2))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Debug)
                .target("realms")
                .args(format_args!("hidden"))
                .build(),
        );
        logger.flush();

        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("INFO  realms::registry: discovered 2"));
        assert!(!written.contains("hidden"));
        assert!(!written.contains("\x1b["));
    }
}
