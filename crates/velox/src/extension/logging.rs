//! Script-facing logging natives backed by `tracing`

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, trace, warn};

use super::Extension;
use crate::error::RegistrationError;
use crate::value::{Item, NativeFunction};
use crate::Interpreter;

/// Severity of a script log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// `LogVerbose`, emitted at `trace`
    Verbose,
    /// `LogDebug`
    Debug,
    /// `LogInfo`
    Info,
    /// `LogWarn`
    Warn,
    /// `LogError`
    Error,
    /// `LogFatal`, emitted at `error` with `fatal = true`
    Fatal,
}

impl LogLevel {
    /// Every level, least severe first.
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Verbose,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    /// Name of the native function scripts call for this level.
    pub fn function_name(self) -> &'static str {
        match self {
            LogLevel::Verbose => "LogVerbose",
            LogLevel::Debug => "LogDebug",
            LogLevel::Info => "LogInfo",
            LogLevel::Warn => "LogWarn",
            LogLevel::Error => "LogError",
            LogLevel::Fatal => "LogFatal",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// One message logged by a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity
    pub level: LogLevel,
    /// Stringified argument
    pub message: String,
    /// Line of the call
    pub line: u32,
}

/// Shared sink collecting every script log message.
///
/// Clones share the same buffer, so a host keeps one handle and gives another
/// to [`LoggingExtension::with_recorder`].
#[derive(Debug, Clone, Default)]
pub struct LogRecorder(Arc<Mutex<Vec<LogRecord>>>);

impl LogRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, record: LogRecord) {
        self.0.lock().push(record);
    }

    /// Snapshot of everything recorded so far
    pub fn records(&self) -> Vec<LogRecord> {
        self.0.lock().clone()
    }

    /// Messages recorded so far, without levels
    pub fn messages(&self) -> Vec<String> {
        self.0.lock().iter().map(|r| r.message.clone()).collect()
    }

    /// Discard everything recorded
    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Exposes `LogVerbose` … `LogFatal` to scripts.
///
/// Each takes one argument, stringifies it and emits a `tracing` event with
/// target `velox`.
#[derive(Debug, Clone, Default)]
pub struct LoggingExtension {
    recorder: Option<LogRecorder>,
}

impl LoggingExtension {
    /// Create the extension without a recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also record every message into `recorder`.
    pub fn with_recorder(recorder: LogRecorder) -> Self {
        Self {
            recorder: Some(recorder),
        }
    }
}

fn emit(level: LogLevel, message: &str, line: u32) {
    match level {
        LogLevel::Verbose => trace!(target: "velox", line, "{}", message),
        LogLevel::Debug => debug!(target: "velox", line, "{}", message),
        LogLevel::Info => info!(target: "velox", line, "{}", message),
        LogLevel::Warn => warn!(target: "velox", line, "{}", message),
        LogLevel::Error => error!(target: "velox", line, "{}", message),
        LogLevel::Fatal => error!(target: "velox", line, fatal = true, "{}", message),
    }
}

impl Extension for LoggingExtension {
    fn name(&self) -> &str {
        "Logging"
    }

    fn inject(&self, interp: &mut Interpreter) -> Result<(), RegistrationError> {
        for level in LogLevel::ALL {
            let recorder = self.recorder.clone();
            interp.add_global_function(NativeFunction::new(
                level.function_name(),
                &["message"],
                move |scope, line| {
                    let message = scope.resolve("message")?.to_string();
                    emit(level, &message, line);
                    if let Some(recorder) = &recorder {
                        recorder.record(LogRecord {
                            level,
                            message,
                            line,
                        });
                    }
                    Ok(Item::undefined())
                },
            ))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injects_every_level() {
        let mut interp = Interpreter::new();
        LoggingExtension::new().inject(&mut interp).unwrap();
        for level in LogLevel::ALL {
            assert!(interp.extensions_scope().contains_local(level.function_name()));
        }
    }

    #[test]
    fn test_recorder_is_shared_between_clones() {
        let recorder = LogRecorder::new();
        let handle = recorder.clone();
        handle.record(LogRecord {
            level: LogLevel::Warn,
            message: "careful".to_string(),
            line: 3,
        });
        assert_eq!(recorder.messages(), vec!["careful"]);
        recorder.clear();
        assert!(handle.records().is_empty());
    }

    #[test]
    fn test_level_display() {
        assert_eq!(LogLevel::Verbose.to_string(), "verbose");
        assert_eq!(LogLevel::Fatal.function_name(), "LogFatal");
    }
}
