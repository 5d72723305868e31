//! SMTP mock server implementation

pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logger;
pub mod message;
pub mod pattern;
pub mod server;
pub mod session;
pub mod wait_group;

pub use commands::{CommandHandler, Flow};
pub use config::{Configuration, ConfigurationBuilder, Defaults, ResponseDelays};
pub use dispatcher::{Dispatcher, Verb};
pub use error::SmtpError;
pub use logger::{EventLogger, Logger};
pub use message::{Exchange, Message, MessageHandle, MessageStore, Slot};
pub use server::Server;
pub use session::{Session, SmtpSession};
pub use wait_group::{TaskCounter, TaskGuard, WaitGroup};
