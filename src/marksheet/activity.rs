use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;

pub const DEFAULT_LOG_FILE: &str = "marksheet_creation_log.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }
}

/// Append-only, human-readable record of what the generator did.
///
/// Passed explicitly to whoever needs it; nothing here touches global
/// logger state.
pub trait ActivityLog {
    fn record(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.record(Level::Info, message);
    }

    fn warning(&self, message: &str) {
        self.record(Level::Warning, message);
    }

    fn error(&self, message: &str) {
        self.record(Level::Error, message);
    }
}

/// Writes `timestamp - LEVEL - message` lines to a single, never-rotated
/// file through a `tracing-appender` writer opened in append mode.
#[derive(Debug)]
pub struct FileActivityLog {
    path: PathBuf,
    writer: RollingFileAppender,
}

impl FileActivityLog {
    /// Opens (creating if needed) the log file and its parent directory.
    pub fn open(path: &Path) -> Result<Self, InitError> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
        let writer = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(file_name)
            .build(dir)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }
}

impl ActivityLog for FileActivityLog {
    fn record(&self, level: Level, message: &str) {
        let line = format!(
            "{} - {} - {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            level.as_str(),
            message
        );
        let mut out = self.writer.make_writer();
        if let Err(e) = out.write_all(line.as_bytes()).and_then(|_| out.flush()) {
            // The activity log must never fail the operation it describes.
            tracing::warn!(path = %self.path.display(), error = %e, "activity log write failed");
        }
    }
}

/// Forwards entries to `tracing`. Used until a workspace provides a log file.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl ActivityLog for TracingLog {
    fn record(&self, level: Level, message: &str) {
        match level {
            Level::Info => tracing::info!(target: "activity", "{}", message),
            Level::Warning => tracing::warn!(target: "activity", "{}", message),
            Level::Error => tracing::error!(target: "activity", "{}", message),
        }
    }
}

/// Keeps entries in memory so tests can assert on them.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: std::cell::RefCell<Vec<(Level, String)>>,
}

#[cfg(test)]
impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.borrow().clone()
    }
}

#[cfg(test)]
impl ActivityLog for MemoryLog {
    fn record(&self, level: Level, message: &str) {
        self.entries.borrow_mut().push((level, message.to_string()));
    }
}
