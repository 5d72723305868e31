//! Leveled logging sink used by the server and its sessions

/// Logging capability handed to the server, dispatcher and handlers
pub trait Logger: Send + Sync {
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
}

/// [`Logger`] emitting `tracing` events.
///
/// Nothing is emitted unless `log_to_stdout` is set. Info and warning events
/// describe server activity and additionally require `log_server_activity`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventLogger {
    log_to_stdout: bool,
    log_server_activity: bool,
}

impl EventLogger {
    pub fn new(log_to_stdout: bool, log_server_activity: bool) -> Self {
        Self {
            log_to_stdout,
            log_server_activity,
        }
    }

    fn activity_enabled(&self) -> bool {
        self.log_to_stdout && self.log_server_activity
    }
}

impl Logger for EventLogger {
    fn info(&self, message: &str) {
        if self.activity_enabled() {
            tracing::info!(target: "smtpmock", "{message}");
        }
    }

    fn warning(&self, message: &str) {
        if self.activity_enabled() {
            tracing::warn!(target: "smtpmock", "{message}");
        }
    }

    fn error(&self, message: &str) {
        if self.log_to_stdout {
            tracing::error!(target: "smtpmock", "{message}");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Level {
        Info,
        Warning,
        Error,
    }

    /// Keeps every entry in memory so tests can assert on them
    #[derive(Debug, Default)]
    pub struct RecordingLogger {
        pub entries: Mutex<Vec<(Level, String)>>,
    }

    impl RecordingLogger {
        pub fn count(&self, level: Level) -> usize {
            self.entries
                .lock()
                .iter()
                .filter(|(entry_level, _)| *entry_level == level)
                .count()
        }

        pub fn contains(&self, level: Level, needle: &str) -> bool {
            self.entries
                .lock()
                .iter()
                .any(|(entry_level, message)| *entry_level == level && message.contains(needle))
        }
    }

    impl Logger for RecordingLogger {
        fn info(&self, message: &str) {
            self.entries.lock().push((Level::Info, message.to_owned()));
        }

        fn warning(&self, message: &str) {
            self.entries.lock().push((Level::Warning, message.to_owned()));
        }

        fn error(&self, message: &str) {
            self.entries.lock().push((Level::Error, message.to_owned()));
        }
    }

    #[test]
    fn test_activity_gating() {
        assert!(!EventLogger::new(false, true).activity_enabled());
        assert!(!EventLogger::new(true, false).activity_enabled());
        assert!(EventLogger::new(true, true).activity_enabled());
    }

    #[test]
    fn test_disabled_logger_is_silent() {
        // No subscriber is installed; this only checks the calls are inert.
        let logger = EventLogger::default();
        logger.info("info");
        logger.warning("warning");
        logger.error("error");
    }

    #[test]
    fn test_recording_logger() {
        let logger = RecordingLogger::default();
        logger.info("SMTP request: HELO example.com");
        logger.warning("read failed");
        assert_eq!(logger.count(Level::Info), 1);
        assert!(logger.contains(Level::Warning, "read"));
        assert!(!logger.contains(Level::Error, "read"));
    }
}
