//! # smtpmock
//!
//! smtpmock is an embedded mock SMTP server for testing.
//!
//! It lets tests drive email code against a real socket and then inspect
//! every command the client sent and every reply it got back.
//!
//! ## Quick Start
//!
//! ```rust
//! use smtpmock::{Configuration, Server};
//! use std::time::Duration;
//!
//! // Port 0 lets the OS pick a free port
//! let mut server = Server::new(Configuration::default());
//! server.start().unwrap();
//! let port = server.port_number();
//!
//! // Application sends email to 127.0.0.1:{port}
//! // ...
//!
//! // Check what the server recorded
//! if let Ok(messages) = server.wait_for_messages(1, Duration::from_millis(100)) {
//!     println!("Received email from: {:?}", messages[0].sender);
//! }
//!
//! server.stop().unwrap();
//! ```
//!
//! ## Supported SMTP commands
//!
//! - `HELO` / `EHLO` - Identify the client
//! - `MAIL FROM` - Specify the sender's address
//! - `RCPT TO` - Specify a recipient (repeatable)
//! - `DATA` - Send the message body
//! - `RSET` - Reset the current transaction
//! - `NOOP` - Do nothing
//! - `QUIT` - Close connection
//!
//! ## Scripted failures
//!
//! [`ConfigurationBuilder`] sets up the failure cases a test wants to see:
//! blacklisted HELO domains, blacklisted senders and recipients, unknown
//! mailboxes, a message size limit, per-command response delays and custom
//! reply text for every response.
//!
//! With `fail_fast` enabled the session ends at the first rejected command.
//! Otherwise the client may retry, which is how real MTAs behave.
//!
//! ## Message records
//!
//! Each accepted connection gets one [`Message`], appended in acceptance
//! order. A record is *consistent* once MAIL FROM, RCPT TO, DATA and the
//! body all succeeded. Records are snapshots, so they can be inspected while
//! the session is still running.
//!
//! ## Logging
//!
//! Server activity is emitted as `tracing` events when `log_to_stdout` is
//! set; per-request activity also needs `log_server_activity`. Install any
//! `tracing` subscriber to see them.
//!
//! ## Notes
//!
//! - Runs in-memory only. Message persistence is not supported.
//! - SMTP authentication is not supported.
//! - SSL/TLS connection is not supported.
//! - Mail relay is not supported.

mod smtp;

pub use smtp::{
    CommandHandler, Configuration, ConfigurationBuilder, Defaults, Dispatcher, EventLogger,
    Exchange, Flow, Logger, Message, MessageHandle, MessageStore, ResponseDelays, Server,
    Session, Slot, SmtpError, SmtpSession, TaskCounter, TaskGuard, Verb, WaitGroup,
};
