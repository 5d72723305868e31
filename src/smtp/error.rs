//! Error types for the mock SMTP server

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmtpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server is already running")]
    AlreadyStarted,

    #[error("Server is not running")]
    NotStarted,

    /// The accept loop could not be woken, so the listener is still bound.
    #[error("Failed to wake accept loop on {addr}: {source}")]
    Wake {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    #[error("Session timed out after {0:?}")]
    Timeout(Duration),

    /// A command was answered with a negative response.
    #[error("Command rejected: {0}")]
    Rejected(String),

    #[error("Expected {expected} messages, received {received} before timeout")]
    WaitTimeout { expected: usize, received: usize },
}

impl Clone for SmtpError {
    fn clone(&self) -> Self {
        match self {
            SmtpError::Io(err) => SmtpError::Io(std::io::Error::new(err.kind(), err.to_string())),
            SmtpError::Bind { addr, source } => SmtpError::Bind {
                addr: addr.clone(),
                source: std::io::Error::new(source.kind(), source.to_string()),
            },
            SmtpError::AlreadyStarted => SmtpError::AlreadyStarted,
            SmtpError::NotStarted => SmtpError::NotStarted,
            SmtpError::Wake { addr, source } => SmtpError::Wake {
                addr: addr.clone(),
                source: std::io::Error::new(source.kind(), source.to_string()),
            },
            SmtpError::ConnectionClosed => SmtpError::ConnectionClosed,
            SmtpError::Timeout(timeout) => SmtpError::Timeout(*timeout),
            SmtpError::Rejected(response) => SmtpError::Rejected(response.clone()),
            SmtpError::WaitTimeout { expected, received } => SmtpError::WaitTimeout {
                expected: *expected,
                received: *received,
            },
        }
    }
}

impl SmtpError {
    /// Classify a read error, turning socket timeouts into [`SmtpError::Timeout`]
    pub fn from_read(err: std::io::Error, timeout: Duration) -> Self {
        match err.kind() {
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => {
                SmtpError::Timeout(timeout)
            }
            std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted => SmtpError::ConnectionClosed,
            _ => SmtpError::Io(err),
        }
    }
}
