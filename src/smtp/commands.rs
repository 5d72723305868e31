//! SMTP command handlers.
//!
//! Each handler runs its checks in a fixed order (command syntax, position
//! in the sequence, argument syntax, then policy) and stops at the first
//! failure. The outcome is written to the handler's slot of the [`Message`]
//! and sent to the client; failures also set the session's pending error.
//!
//! [`Message`]: crate::smtp::message::Message

use crate::smtp::config::Configuration;
use crate::smtp::error::SmtpError;
use crate::smtp::logger::Logger;
use crate::smtp::message::{Exchange, MessageHandle, Slot};
use crate::smtp::pattern::{self, DOMAIN_GROUP};
use crate::smtp::session::Session;

use std::time::Duration;

const CRLF: &[u8] = b"\r\n";
const LF: &[u8] = b"\n";
const NO_TERMINATOR: &[u8] = b"";

/// Room for a stuffed dot and a CRLF on top of the remaining body allowance
const LINE_SLACK: usize = 4;
/// Read size while discarding an oversized body
const DRAIN_CHUNK: usize = 8192;

/// What the dispatcher should do once a handler returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next command
    Continue,
    /// Close the connection without further reads
    Terminate,
}

/// Runs SMTP commands for one connection
pub struct CommandHandler<'a, S: Session> {
    session: &'a mut S,
    message: &'a MessageHandle,
    configuration: &'a Configuration,
    logger: &'a dyn Logger,
}

impl<'a, S: Session> CommandHandler<'a, S> {
    pub fn new(
        session: &'a mut S,
        message: &'a MessageHandle,
        configuration: &'a Configuration,
        logger: &'a dyn Logger,
    ) -> Self {
        Self {
            session,
            message,
            configuration,
            logger,
        }
    }

    /// Handle HELO and EHLO
    pub fn helo(&mut self, request: &str) -> Flow {
        let config = self.configuration;
        let delay = config.delays.helo;

        if !pattern::matches(request, &pattern::HELO_CMD) {
            return self.reject(Slot::Helo, request, &config.msg_invalid_cmd, delay);
        }
        if self.message.read(|message| message.helo.success) {
            return self.reject(Slot::Helo, request, &config.msg_invalid_cmd_helo_sequence, delay);
        }
        let Some(domain) = pattern::capture(request, &pattern::HELO_ARG, DOMAIN_GROUP) else {
            return self.reject(Slot::Helo, request, &config.msg_invalid_cmd_helo_arg, delay);
        };
        if config.is_blacklisted_helo_domain(domain) {
            self.logger
                .warning(&format!("HELO domain {domain} is blacklisted"));
            // A blacklisted client is told goodbye and disconnected.
            self.reject(Slot::Helo, request, &config.msg_quit_cmd, delay);
            return Flow::Terminate;
        }

        self.accept(Slot::Helo, request, &config.msg_helo_received, delay)
    }

    /// Handle MAIL FROM
    pub fn mail_from(&mut self, request: &str) -> Flow {
        let config = self.configuration;
        let delay = config.delays.mail_from;

        if !pattern::matches(request, &pattern::MAIL_FROM_CMD) {
            return self.reject(Slot::MailFrom, request, &config.msg_invalid_cmd, delay);
        }
        if !self.message.read(|message| message.helo.success) {
            return self.reject(
                Slot::MailFrom,
                request,
                &config.msg_invalid_cmd_mailfrom_sequence,
                delay,
            );
        }
        let Some(email) = pattern::capture_email(request, &pattern::MAIL_FROM_ARG) else {
            return self.reject(
                Slot::MailFrom,
                request,
                &config.msg_invalid_cmd_mailfrom_arg,
                delay,
            );
        };
        if config.is_blacklisted_mailfrom_email(email) {
            self.logger
                .warning(&format!("MAIL FROM {email} is blacklisted"));
            return self.reject(
                Slot::MailFrom,
                request,
                &config.msg_mailfrom_blacklisted_email,
                delay,
            );
        }

        let sender = email.to_owned();
        self.message
            .update(|message| message.sender = Some(sender));
        self.accept(Slot::MailFrom, request, &config.msg_mailfrom_received, delay)
    }

    /// Handle RCPT TO; may be repeated for several recipients
    pub fn rcpt_to(&mut self, request: &str) -> Flow {
        let config = self.configuration;
        let delay = config.delays.rcpt_to;

        if !pattern::matches(request, &pattern::RCPT_TO_CMD) {
            return self.reject(Slot::RcptTo, request, &config.msg_invalid_cmd, delay);
        }
        if !self.message.read(|message| message.mail_from.success) {
            return self.reject(
                Slot::RcptTo,
                request,
                &config.msg_invalid_cmd_rcptto_sequence,
                delay,
            );
        }
        let Some(email) = pattern::capture_email(request, &pattern::RCPT_TO_ARG) else {
            return self.reject(Slot::RcptTo, request, &config.msg_invalid_cmd_rcptto_arg, delay);
        };
        if config.is_blacklisted_rcptto_email(email) {
            self.logger
                .warning(&format!("RCPT TO {email} is blacklisted"));
            return self.reject(
                Slot::RcptTo,
                request,
                &config.msg_rcptto_blacklisted_email,
                delay,
            );
        }
        if config.is_not_registered_email(email) {
            self.logger
                .warning(&format!("RCPT TO {email} is not registered"));
            return self.reject(
                Slot::RcptTo,
                request,
                &config.msg_rcptto_not_registered_email,
                delay,
            );
        }

        let recipient = email.to_owned();
        self.message
            .update(|message| message.recipients.push(recipient));
        self.accept(Slot::RcptTo, request, &config.msg_rcptto_received, delay)
    }

    /// Handle DATA and, once accepted, collect the message body
    pub fn data(&mut self, request: &str) -> Flow {
        let config = self.configuration;
        let delay = config.delays.data;

        if !pattern::matches(request, &pattern::DATA_CMD) {
            return self.reject(Slot::Data, request, &config.msg_invalid_cmd_data_arg, delay);
        }
        if !self.message.read(|message| message.rcpt_to.success) {
            return self.reject(
                Slot::Data,
                request,
                &config.msg_invalid_cmd_data_sequence,
                delay,
            );
        }

        self.accept(Slot::Data, request, &config.msg_data_received, delay);
        self.body()
    }

    /// Read the dot-terminated message body.
    ///
    /// The limit applies to the bytes on the wire and reads are bounded by
    /// what is still allowed. Once the body grows past the limit the rest of
    /// it is still read up to the terminator but discarded.
    pub fn body(&mut self) -> Flow {
        let config = self.configuration;
        let limit = config.message_size_limit;
        let mut body = Vec::new();
        // Terminator of the last complete line, counted once more content follows
        let mut pending = NO_TERMINATOR;
        let mut line_start = true;
        let mut too_big = false;

        loop {
            let max = if too_big {
                DRAIN_CHUNK
            } else {
                limit
                    .saturating_sub(body.len() + pending.len())
                    .saturating_add(LINE_SLACK)
            };
            let Ok(chunk) = self.session.read_chunk(max) else {
                return Flow::Terminate;
            };

            let starts_line = line_start;
            line_start = chunk.ends_with(b"\n");
            let (content, terminator) = split_terminator_bytes(&chunk);
            if starts_line && line_start && content == b"." {
                break;
            }
            if too_big {
                continue;
            }

            let content = if starts_line {
                content.strip_prefix(b".").unwrap_or(content)
            } else {
                content
            };
            if body.len() + pending.len() + content.len() > limit {
                too_big = true;
                body = Vec::new();
                continue;
            }
            body.extend_from_slice(pending);
            body.extend_from_slice(content);
            pending = terminator;
        }

        let delay = config.delays.message;
        if too_big {
            self.logger.warning(&format!(
                "message body exceeded the limit of {limit} bytes"
            ));
            return self.reject(Slot::Body, "", &config.msg_size_is_too_big, delay);
        }

        self.logger
            .info(&format!("received message body of {} bytes", body.len()));
        let body = String::from_utf8_lossy(&body);
        self.accept(Slot::Body, &body, &config.msg_received, delay)
    }

    /// Handle RSET: clear the mail transaction, keep the HELO
    pub fn rset(&mut self, request: &str) -> Flow {
        let config = self.configuration;
        let delay = config.delays.rset;

        if !pattern::matches(request, &pattern::RSET_CMD) {
            return self.reject(Slot::Rset, request, &config.msg_invalid_cmd_rset_arg, delay);
        }
        if !self.message.read(|message| message.helo.success) {
            return self.reject(
                Slot::Rset,
                request,
                &config.msg_invalid_cmd_rset_sequence,
                delay,
            );
        }

        self.message.update(|message| message.reset_transaction());
        self.accept(Slot::Rset, request, &config.msg_rset_received, delay)
    }

    pub fn noop(&mut self, request: &str) -> Flow {
        let config = self.configuration;
        let delay = config.delays.noop;

        if !pattern::matches(request, &pattern::NOOP_CMD) {
            self.respond(&config.msg_invalid_cmd_noop_arg, false, delay);
            return Flow::Continue;
        }

        self.message.update(|message| message.noop_count += 1);
        self.respond(&config.msg_noop_received, true, delay);
        Flow::Continue
    }

    /// Handle QUIT; the dispatcher stops once `quit_sent` is set
    pub fn quit(&mut self, request: &str) -> Flow {
        let config = self.configuration;
        let delay = config.delays.quit;

        if !pattern::matches(request, &pattern::QUIT_CMD) {
            self.respond(&config.msg_invalid_cmd_quit_arg, false, delay);
            return Flow::Continue;
        }

        self.message.update(|message| message.quit_sent = true);
        self.respond(&config.msg_quit_cmd, true, delay);
        Flow::Terminate
    }

    /// Answer a request whose verb is not recognized
    pub fn unknown(&mut self, request: &str) -> Flow {
        self.logger
            .warning(&format!("unrecognized command: {request}"));
        let config = self.configuration;
        self.respond(&config.msg_invalid_cmd, false, Duration::ZERO);
        Flow::Continue
    }

    fn accept(&mut self, slot: Slot, request: &str, response: &str, delay: Duration) -> Flow {
        self.resolve(slot, request, response, true, delay);
        Flow::Continue
    }

    fn reject(&mut self, slot: Slot, request: &str, response: &str, delay: Duration) -> Flow {
        self.resolve(slot, request, response, false, delay);
        Flow::Continue
    }

    fn resolve(&mut self, slot: Slot, request: &str, response: &str, success: bool, delay: Duration) {
        let exchange = Exchange::new(request, response, success);
        self.message
            .update(|message| *message.exchange_mut(slot) = exchange);
        self.respond(response, success, delay);
    }

    fn respond(&mut self, response: &str, success: bool, delay: Duration) {
        self.session.write_response(response, delay);
        if !success {
            self.session
                .mark_error(SmtpError::Rejected(response.to_owned()));
        }
    }
}

/// Split raw body bytes into content and CRLF or LF terminator
fn split_terminator_bytes(line: &[u8]) -> (&[u8], &'static [u8]) {
    if let Some(content) = line.strip_suffix(b"\r\n") {
        (content, CRLF)
    } else if let Some(content) = line.strip_suffix(b"\n") {
        (content, LF)
    } else {
        (line, NO_TERMINATOR)
    }
}

/// Split a raw line into its content and its CRLF or LF terminator
pub fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else {
        (line, "")
    }
}
