//! Per-connection transport: line reads, response writes and the pending
//! error slot that fail-fast handling inspects

use crate::smtp::error::SmtpError;
use crate::smtp::logger::Logger;

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Transport operations the dispatcher and command handlers rely on.
///
/// Every failure lands in a single pending-error slot, so "did the last
/// operation fail" is always answered by [`Session::has_error`].
pub trait Session {
    /// Read one line, terminator included.
    ///
    /// An error is stored in the pending-error slot and also returned; the
    /// caller treats it as the peer being gone.
    fn read_line(&mut self) -> Result<String, SmtpError>;

    /// Read raw bytes up to and including the next LF, returning early once
    /// `max` bytes have been read. Failures are handled like
    /// [`read_line`](Session::read_line).
    fn read_chunk(&mut self, max: usize) -> Result<Vec<u8>, SmtpError>;

    /// Wait for `delay`, then write `response` followed by CRLF.
    /// Write failures are logged and otherwise ignored.
    fn write_response(&mut self, response: &str, delay: Duration);

    fn mark_error(&mut self, err: SmtpError);
    fn clear_error(&mut self);
    fn error(&self) -> Option<&SmtpError>;

    fn has_error(&self) -> bool {
        self.error().is_some()
    }

    /// Deadline applied to the following reads
    fn set_timeout(&mut self, timeout: Duration);

    fn close(&mut self);
}

/// [`Session`] over an accepted TCP connection
pub struct SmtpSession {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
    peer: String,
    timeout: Duration,
    error: Option<SmtpError>,
    logger: Arc<dyn Logger>,
    closed: bool,
}

impl SmtpSession {
    pub fn new(stream: TcpStream, logger: Arc<dyn Logger>) -> Result<Self, SmtpError> {
        let reader = BufReader::new(stream.try_clone()?);
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        Ok(Self {
            stream,
            reader,
            peer,
            timeout: Duration::ZERO,
            error: None,
            logger,
            closed: false,
        })
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    fn read_until_newline(&mut self, max: u64) -> Result<Vec<u8>, SmtpError> {
        let mut buffer = Vec::new();
        let result = match (&mut self.reader).take(max).read_until(b'\n', &mut buffer) {
            Ok(0) => Err(SmtpError::ConnectionClosed),
            Ok(_) => Ok(buffer),
            Err(e) => Err(SmtpError::from_read(e, self.timeout)),
        };

        result.inspect_err(|err| {
            self.logger
                .warning(&format!("{}: failed to read request: {err}", self.peer));
            self.error = Some(err.clone());
        })
    }
}

impl Session for SmtpSession {
    fn read_line(&mut self) -> Result<String, SmtpError> {
        let line = self.read_until_newline(u64::MAX)?;
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    fn read_chunk(&mut self, max: usize) -> Result<Vec<u8>, SmtpError> {
        self.read_until_newline(max.max(1) as u64)
    }

    fn write_response(&mut self, response: &str, delay: Duration) {
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        let result = self
            .stream
            .write_all(format!("{response}\r\n").as_bytes())
            .and_then(|_| self.stream.flush());

        match result {
            Ok(()) => self
                .logger
                .info(&format!("{}: SMTP response: {response}", self.peer)),
            Err(e) => self
                .logger
                .warning(&format!("{}: failed to write response: {e}", self.peer)),
        }
    }

    fn mark_error(&mut self, err: SmtpError) {
        self.error = Some(err);
    }

    fn clear_error(&mut self) {
        self.error = None;
    }

    fn error(&self) -> Option<&SmtpError> {
        self.error.as_ref()
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
        let timeout = (!timeout.is_zero()).then_some(timeout);
        if let Err(e) = self.stream.set_read_timeout(timeout) {
            self.logger
                .warning(&format!("{}: failed to set timeout: {e}", self.peer));
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => self
                .logger
                .info(&format!("{}: connection closed", self.peer)),
            // Already torn down by the peer or by Server::stop
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => {}
            Err(e) => self
                .logger
                .warning(&format!("{}: failed to close connection: {e}", self.peer)),
        }
    }
}
