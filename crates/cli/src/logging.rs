//! Two-sink logger: short messages for the user in the tmux status line
//! (stderr when reading from `--input`), full records in an optional file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{bail, Result};
use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::config::{parse_level, Cli};

const TARGET_PREFIX: &str = "fzf_links";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSettings {
    pub display_level: LevelFilter,
    pub file_level: LevelFilter,
    pub file: Option<PathBuf>,
    pub to_stderr: bool,
}

impl LogSettings {
    pub fn from_cli(cli: &Cli) -> Self {
        let file = cli.log_filename.trim();
        Self {
            display_level: parse_level(&cli.loglevel_tmux),
            file_level: parse_level(&cli.loglevel_file),
            file: (!file.is_empty()).then(|| PathBuf::from(file)),
            to_stderr: cli.input.is_some(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DisplaySink {
    Tmux,
    Stderr,
}

impl DisplaySink {
    fn emit(self, record: &Record) {
        let message = format!("fzf-links: {}", record.args());
        if self == DisplaySink::Tmux && display_in_tmux(&message, record.level()) {
            return;
        }
        eprintln!("{message}");
    }
}

/// Warnings and errors stay on the status line until a key is pressed.
fn display_in_tmux(message: &str, level: Level) -> bool {
    let mut command = Command::new("tmux");
    command.arg("display-message");
    if level <= Level::Warn {
        command.args(["-d", "0"]);
    }
    command
        .arg(message)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

struct PluginLogger {
    display: DisplaySink,
    display_level: LevelFilter,
    file: Option<env_logger::Logger>,
}

impl PluginLogger {
    fn max_level(&self) -> LevelFilter {
        let file_level = self
            .file
            .as_ref()
            .map(env_logger::Logger::filter)
            .unwrap_or(LevelFilter::Off);
        self.display_level.max(file_level)
    }
}

impl Log for PluginLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with(TARGET_PREFIX)
            && (metadata.level() <= self.display_level
                || self.file.as_ref().is_some_and(|file| file.enabled(metadata)))
    }

    fn log(&self, record: &Record) {
        if !record.target().starts_with(TARGET_PREFIX) {
            return;
        }
        if record.level() <= self.display_level {
            self.display.emit(record);
        }
        if let Some(file) = &self.file {
            file.log(record);
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            file.flush();
        }
    }
}

fn file_logger(path: &Path, level: LevelFilter) -> std::io::Result<env_logger::Logger> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let logger = env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - fzf-links - {} - {}",
                buf.timestamp_millis(),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(file)))
        .build();
    Ok(logger)
}

/// Install the process logger.
///
/// When the log file cannot be opened the display sink is still installed,
/// with its threshold lowered to everything, and an error is returned.
pub fn init(settings: &LogSettings) -> Result<()> {
    let display = if settings.to_stderr {
        DisplaySink::Stderr
    } else {
        DisplaySink::Tmux
    };

    let mut display_level = settings.display_level;
    let mut file = None;
    let mut file_error = None;
    if let Some(path) = &settings.file {
        match file_logger(path, settings.file_level) {
            Ok(logger) => file = Some(logger),
            Err(err) => {
                display_level = LevelFilter::Trace;
                file_error = Some((path.clone(), err));
            }
        }
    }

    if let Some(file) = &file {
        file.log(
            &Record::builder()
                .args(format_args!("fzf-links tmux plugin started"))
                .level(Level::Info)
                .target(TARGET_PREFIX)
                .build(),
        );
    }

    let logger = PluginLogger {
        display,
        display_level,
        file,
    };
    log::set_max_level(logger.max_level());
    log::set_boxed_logger(Box::new(logger))?;

    if let Some((path, err)) = file_error {
        bail!(
            "logging to file not allowed. Check you have permissions to write to logfile: {} ({err})",
            path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn settings_follow_cli() {
        let cli = Cli::parse_from([
            "fzf-links",
            "--loglevel-tmux",
            "error",
            "--log-filename",
            "/tmp/fzf-links.log",
            "--input",
            "-",
        ]);
        assert_eq!(
            LogSettings::from_cli(&cli),
            LogSettings {
                display_level: LevelFilter::Error,
                file_level: LevelFilter::Debug,
                file: Some(PathBuf::from("/tmp/fzf-links.log")),
                to_stderr: true,
            }
        );
    }

    #[test]
    fn file_sink_writes_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let logger = file_logger(&path, LevelFilter::Info).unwrap();
        logger.log(
            &Record::builder()
                .args(format_args!("no link found"))
                .level(Level::Info)
                .target("fzf_links")
                .build(),
        );
        logger.log(
            &Record::builder()
                .args(format_args!("hidden"))
                .level(Level::Debug)
                .target("fzf_links")
                .build(),
        );
        logger.flush();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains(" - fzf-links - INFO - no link found"));
        assert!(!written.contains("hidden"));
    }
}
