//! Leveled log capability handed to the source at construction.

use std::sync::Arc;
use tracing::Level;

pub trait LogSink {
    fn log(&self, level: Level, source: &str, message: &str);

    fn debug(&self, source: &str, message: &str) {
        self.log(Level::DEBUG, source, message);
    }

    fn error(&self, source: &str, message: &str) {
        self.log(Level::ERROR, source, message);
    }
}

impl<T: LogSink + ?Sized> LogSink for &T {
    fn log(&self, level: Level, source: &str, message: &str) {
        (**self).log(level, source, message);
    }
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn log(&self, level: Level, source: &str, message: &str) {
        (**self).log(level, source, message);
    }
}

/// Forwards to `tracing`, with the source tag as a structured field.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: Level, source: &str, message: &str) {
        match level {
            Level::ERROR => tracing::error!(source = source, "{}", message),
            Level::WARN => tracing::warn!(source = source, "{}", message),
            Level::INFO => tracing::info!(source = source, "{}", message),
            Level::DEBUG => tracing::debug!(source = source, "{}", message),
            _ => tracing::trace!(source = source, "{}", message),
        }
    }
}

#[cfg(feature = "mock")]
pub use memory::{LogRecord, MemorySink};

#[cfg(feature = "mock")]
mod memory {
    use super::LogSink;
    use std::sync::Mutex;
    use tracing::Level;

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct LogRecord {
        pub level: Level,
        pub source: String,
        pub message: String,
    }

    /// Keeps every record in memory, in order.
    #[derive(Debug, Default)]
    pub struct MemorySink {
        records: Mutex<Vec<LogRecord>>,
    }

    impl MemorySink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn records(&self) -> Vec<LogRecord> {
            match self.records.lock() {
                Ok(guard) => guard.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            }
        }

        pub fn messages(&self, level: Level) -> Vec<String> {
            self.records()
                .into_iter()
                .filter(|r| r.level == level)
                .map(|r| r.message)
                .collect()
        }
    }

    impl LogSink for MemorySink {
        fn log(&self, level: Level, source: &str, message: &str) {
            let record = LogRecord {
                level,
                source: source.to_string(),
                message: message.to_string(),
            };
            match self.records.lock() {
                Ok(mut guard) => guard.push(record),
                Err(poisoned) => poisoned.into_inner().push(record),
            }
        }
    }
}
