//! Per-connection command loop

use crate::smtp::commands::{CommandHandler, Flow, split_terminator};
use crate::smtp::config::Configuration;
use crate::smtp::logger::Logger;
use crate::smtp::message::MessageHandle;
use crate::smtp::session::Session;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// SMTP verb a request line starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Helo,
    MailFrom,
    RcptTo,
    Data,
    Rset,
    Noop,
    Quit,
    Unknown,
}

impl Verb {
    /// Classify a request by its first whitespace-delimited token,
    /// ignoring case
    pub fn classify(request: &str) -> Self {
        let token = request.split_whitespace().next().unwrap_or_default();
        match token.to_ascii_uppercase().as_str() {
            "HELO" | "EHLO" => Verb::Helo,
            "MAIL" => Verb::MailFrom,
            "RCPT" => Verb::RcptTo,
            "DATA" => Verb::Data,
            "RSET" => Verb::Rset,
            "NOOP" => Verb::Noop,
            "QUIT" => Verb::Quit,
            _ => Verb::Unknown,
        }
    }
}

/// Drives one connection from greeting to close
pub struct Dispatcher<'a> {
    configuration: &'a Configuration,
    logger: &'a dyn Logger,
    shutdown: &'a AtomicBool,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        configuration: &'a Configuration,
        logger: &'a dyn Logger,
        shutdown: &'a AtomicBool,
    ) -> Self {
        Self {
            configuration,
            logger,
            shutdown,
        }
    }

    /// Serve the session until QUIT, a read failure, shutdown, or (with
    /// fail-fast on) the first failed command. The session is closed on
    /// every path.
    pub fn run<S: Session>(&self, session: &mut S, message: &MessageHandle) {
        self.serve(session, message);
        session.close();
    }

    fn serve<S: Session>(&self, session: &mut S, message: &MessageHandle) {
        let config = self.configuration;
        session.write_response(&config.msg_greeting, Duration::ZERO);

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                self.logger.info("server is shutting down, ending session");
                return;
            }

            // Retries start from a clean slate; only the latest command
            // decides whether the session fails fast.
            session.clear_error();
            session.set_timeout(config.session_timeout);

            let Ok(line) = session.read_line() else {
                return;
            };
            let request = split_terminator(&line).0.trim();
            self.logger.info(&format!("SMTP request: {request}"));

            let mut handler = CommandHandler::new(session, message, config, self.logger);
            let flow = match Verb::classify(request) {
                Verb::Helo => handler.helo(request),
                Verb::MailFrom => handler.mail_from(request),
                Verb::RcptTo => handler.rcpt_to(request),
                Verb::Data => handler.data(request),
                Verb::Rset => handler.rset(request),
                Verb::Noop => handler.noop(request),
                Verb::Quit => handler.quit(request),
                Verb::Unknown => handler.unknown(request),
            };

            if flow == Flow::Terminate || message.read(|message| message.quit_sent) {
                return;
            }
            if config.fail_fast && session.has_error() {
                self.logger
                    .warning("command failed with fail-fast enabled, ending session");
                return;
            }
        }
    }
}
