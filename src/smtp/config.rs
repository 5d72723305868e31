//! Server configuration and its defaults

use std::collections::HashSet;
use std::time::Duration;

/// Default values used for every setting left unset on the builder
pub struct Defaults;

impl Defaults {
    pub const HOST_ADDRESS: &'static str = "127.0.0.1";
    /// Port 0 lets the OS assign an ephemeral port
    pub const PORT_NUMBER: u16 = 0;
    pub const SESSION_TIMEOUT: Duration = Duration::from_secs(30);
    pub const MESSAGE_SIZE_LIMIT: usize = 10 * 1024 * 1024; // 10MiB

    pub const GREETING_MSG: &'static str = "220 Welcome";
    pub const INVALID_CMD_MSG: &'static str = "500 Invalid command";
    pub const QUIT_CMD_MSG: &'static str = "221 Bye";

    pub const INVALID_CMD_HELO_SEQUENCE_MSG: &'static str =
        "503 Bad sequence of commands. HELO was already received";
    pub const INVALID_CMD_HELO_ARG_MSG: &'static str = "501 HELO requires domain address";
    pub const HELO_RECEIVED_MSG: &'static str = "250 Received";

    pub const INVALID_CMD_MAILFROM_SEQUENCE_MSG: &'static str =
        "503 Bad sequence of commands. HELO command required first";
    pub const INVALID_CMD_MAILFROM_ARG_MSG: &'static str =
        "501 MAIL FROM requires valid email address";
    pub const MAILFROM_BLACKLISTED_EMAIL_MSG: &'static str = "550 Blacklisted sender email";
    pub const MAILFROM_RECEIVED_MSG: &'static str = "250 Received";

    pub const INVALID_CMD_RCPTTO_SEQUENCE_MSG: &'static str =
        "503 Bad sequence of commands. MAIL FROM command required first";
    pub const INVALID_CMD_RCPTTO_ARG_MSG: &'static str = "501 RCPT TO requires valid email address";
    pub const RCPTTO_BLACKLISTED_EMAIL_MSG: &'static str = "550 Blacklisted recipient email";
    pub const RCPTTO_NOT_REGISTERED_EMAIL_MSG: &'static str = "550 User not found";
    pub const RCPTTO_RECEIVED_MSG: &'static str = "250 Received";

    pub const INVALID_CMD_DATA_SEQUENCE_MSG: &'static str =
        "503 Bad sequence of commands. RCPT TO command required first";
    pub const INVALID_CMD_DATA_ARG_MSG: &'static str = "501 DATA command takes no arguments";
    pub const DATA_RECEIVED_MSG: &'static str =
        "354 Ready for receive message. End data with <CR><LF>.<CR><LF>";

    pub const MSG_RECEIVED_MSG: &'static str = "250 Received";

    pub const INVALID_CMD_RSET_SEQUENCE_MSG: &'static str =
        "503 Bad sequence of commands. HELO command required first";
    pub const INVALID_CMD_RSET_ARG_MSG: &'static str = "501 RSET command takes no arguments";
    pub const RSET_RECEIVED_MSG: &'static str = "250 Ok";

    pub const INVALID_CMD_NOOP_ARG_MSG: &'static str = "501 NOOP command takes no arguments";
    pub const NOOP_RECEIVED_MSG: &'static str = "250 Ok";

    pub const INVALID_CMD_QUIT_ARG_MSG: &'static str = "501 QUIT command takes no arguments";

    /// The "message too big" response, templated with the resolved limit
    pub fn msg_size_is_too_big(limit: usize) -> String {
        format!("552 Message exceeded max size of {limit} bytes")
    }
}

/// Artificial latency applied before writing the response to each command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponseDelays {
    pub helo: Duration,
    pub mail_from: Duration,
    pub rcpt_to: Duration,
    pub data: Duration,
    /// Before the reply to the body's terminating dot
    pub message: Duration,
    pub rset: Duration,
    pub noop: Duration,
    pub quit: Duration,
}

/// Fully resolved, immutable server configuration.
///
/// Built once through [`ConfigurationBuilder`] and shared read-only with
/// every connection.
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Address the listener binds to
    pub host_address: String,
    /// Port to listen on, 0 for an OS-assigned one
    pub port_number: u16,
    /// Master switch for `tracing` output
    pub log_to_stdout: bool,
    /// Also log per-request activity (needs `log_to_stdout`)
    pub log_server_activity: bool,
    /// End the session at the first rejected command
    pub fail_fast: bool,
    /// Read deadline applied before every client read
    pub session_timeout: Duration,
    /// Largest accepted message body, in bytes
    pub message_size_limit: usize,
    /// Per-command latency before responses are written
    pub delays: ResponseDelays,

    /// HELO/EHLO domains answered with `msg_quit_cmd` and disconnected
    pub blacklisted_helo_domains: HashSet<String>,
    /// Senders rejected at MAIL FROM
    pub blacklisted_mailfrom_emails: HashSet<String>,
    /// Recipients rejected at RCPT TO as blacklisted
    pub blacklisted_rcptto_emails: HashSet<String>,
    /// Recipients rejected at RCPT TO as unknown mailboxes
    pub not_registered_emails: HashSet<String>,

    /// Sent once when a client connects
    pub msg_greeting: String,
    /// Reply to an unrecognized or malformed command
    pub msg_invalid_cmd: String,
    /// Reply to QUIT, also sent to a blacklisted HELO domain
    pub msg_quit_cmd: String,

    /// HELO after a HELO was already accepted
    pub msg_invalid_cmd_helo_sequence: String,
    /// HELO without a valid domain or address literal
    pub msg_invalid_cmd_helo_arg: String,
    /// HELO accepted
    pub msg_helo_received: String,

    /// MAIL FROM before HELO
    pub msg_invalid_cmd_mailfrom_sequence: String,
    /// MAIL FROM without a valid address
    pub msg_invalid_cmd_mailfrom_arg: String,
    /// Sender is in `blacklisted_mailfrom_emails`
    pub msg_mailfrom_blacklisted_email: String,
    /// MAIL FROM accepted
    pub msg_mailfrom_received: String,

    /// RCPT TO before an accepted MAIL FROM
    pub msg_invalid_cmd_rcptto_sequence: String,
    /// RCPT TO without a valid address
    pub msg_invalid_cmd_rcptto_arg: String,
    /// Recipient is in `blacklisted_rcptto_emails`
    pub msg_rcptto_blacklisted_email: String,
    /// Recipient is in `not_registered_emails`
    pub msg_rcptto_not_registered_email: String,
    /// RCPT TO accepted
    pub msg_rcptto_received: String,

    /// DATA before an accepted RCPT TO
    pub msg_invalid_cmd_data_sequence: String,
    /// DATA followed by arguments
    pub msg_invalid_cmd_data_arg: String,
    /// DATA accepted, body may follow
    pub msg_data_received: String,

    /// Body larger than `message_size_limit`
    pub msg_size_is_too_big: String,
    /// Body accepted
    pub msg_received: String,

    /// RSET before HELO
    pub msg_invalid_cmd_rset_sequence: String,
    /// RSET followed by arguments
    pub msg_invalid_cmd_rset_arg: String,
    /// RSET accepted
    pub msg_rset_received: String,

    /// NOOP followed by arguments
    pub msg_invalid_cmd_noop_arg: String,
    /// NOOP accepted
    pub msg_noop_received: String,

    /// QUIT followed by arguments
    pub msg_invalid_cmd_quit_arg: String,
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// `host:port` string the listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host_address, self.port_number)
    }

    pub fn is_blacklisted_helo_domain(&self, domain: &str) -> bool {
        contains_ignore_case(&self.blacklisted_helo_domains, domain)
    }

    pub fn is_blacklisted_mailfrom_email(&self, email: &str) -> bool {
        contains_ignore_case(&self.blacklisted_mailfrom_emails, email)
    }

    pub fn is_blacklisted_rcptto_email(&self, email: &str) -> bool {
        contains_ignore_case(&self.blacklisted_rcptto_emails, email)
    }

    pub fn is_not_registered_email(&self, email: &str) -> bool {
        contains_ignore_case(&self.not_registered_emails, email)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        ConfigurationBuilder::default().build()
    }
}

fn contains_ignore_case(set: &HashSet<String>, value: &str) -> bool {
    set.contains(value) || set.iter().any(|entry| entry.eq_ignore_ascii_case(value))
}

macro_rules! message_setters {
    ($($field:ident),* $(,)?) => {
        $(
            pub fn $field(mut self, message: impl Into<String>) -> Self {
                self.$field = Some(message.into());
                self
            }
        )*
    };
}

/// Sparse set of configuration attributes.
///
/// Anything not set falls back to [`Defaults`] when [`build`](Self::build)
/// is called.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationBuilder {
    host_address: Option<String>,
    port_number: Option<u16>,
    log_to_stdout: bool,
    log_server_activity: bool,
    fail_fast: bool,
    session_timeout: Option<Duration>,
    message_size_limit: Option<usize>,
    delays: ResponseDelays,

    blacklisted_helo_domains: HashSet<String>,
    blacklisted_mailfrom_emails: HashSet<String>,
    blacklisted_rcptto_emails: HashSet<String>,
    not_registered_emails: HashSet<String>,

    msg_greeting: Option<String>,
    msg_invalid_cmd: Option<String>,
    msg_quit_cmd: Option<String>,
    msg_invalid_cmd_helo_sequence: Option<String>,
    msg_invalid_cmd_helo_arg: Option<String>,
    msg_helo_received: Option<String>,
    msg_invalid_cmd_mailfrom_sequence: Option<String>,
    msg_invalid_cmd_mailfrom_arg: Option<String>,
    msg_mailfrom_blacklisted_email: Option<String>,
    msg_mailfrom_received: Option<String>,
    msg_invalid_cmd_rcptto_sequence: Option<String>,
    msg_invalid_cmd_rcptto_arg: Option<String>,
    msg_rcptto_blacklisted_email: Option<String>,
    msg_rcptto_not_registered_email: Option<String>,
    msg_rcptto_received: Option<String>,
    msg_invalid_cmd_data_sequence: Option<String>,
    msg_invalid_cmd_data_arg: Option<String>,
    msg_data_received: Option<String>,
    msg_size_is_too_big: Option<String>,
    msg_received: Option<String>,
    msg_invalid_cmd_rset_sequence: Option<String>,
    msg_invalid_cmd_rset_arg: Option<String>,
    msg_rset_received: Option<String>,
    msg_invalid_cmd_noop_arg: Option<String>,
    msg_noop_received: Option<String>,
    msg_invalid_cmd_quit_arg: Option<String>,
}

impl ConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host_address(mut self, host: impl Into<String>) -> Self {
        self.host_address = Some(host.into());
        self
    }

    pub fn port_number(mut self, port: u16) -> Self {
        self.port_number = Some(port);
        self
    }

    pub fn log_to_stdout(mut self, enabled: bool) -> Self {
        self.log_to_stdout = enabled;
        self
    }

    pub fn log_server_activity(mut self, enabled: bool) -> Self {
        self.log_server_activity = enabled;
        self
    }

    /// End the session on the first failed command instead of letting the
    /// client retry
    pub fn fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }

    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = Some(timeout);
        self
    }

    /// Maximum accepted message body size in bytes
    pub fn message_size_limit(mut self, limit: usize) -> Self {
        self.message_size_limit = Some(limit);
        self
    }

    pub fn response_delays(mut self, delays: ResponseDelays) -> Self {
        self.delays = delays;
        self
    }

    pub fn blacklisted_helo_domains<I, T>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.blacklisted_helo_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn blacklisted_mailfrom_emails<I, T>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.blacklisted_mailfrom_emails = emails.into_iter().map(Into::into).collect();
        self
    }

    pub fn blacklisted_rcptto_emails<I, T>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.blacklisted_rcptto_emails = emails.into_iter().map(Into::into).collect();
        self
    }

    pub fn not_registered_emails<I, T>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.not_registered_emails = emails.into_iter().map(Into::into).collect();
        self
    }

    message_setters!(
        msg_greeting,
        msg_invalid_cmd,
        msg_quit_cmd,
        msg_invalid_cmd_helo_sequence,
        msg_invalid_cmd_helo_arg,
        msg_helo_received,
        msg_invalid_cmd_mailfrom_sequence,
        msg_invalid_cmd_mailfrom_arg,
        msg_mailfrom_blacklisted_email,
        msg_mailfrom_received,
        msg_invalid_cmd_rcptto_sequence,
        msg_invalid_cmd_rcptto_arg,
        msg_rcptto_blacklisted_email,
        msg_rcptto_not_registered_email,
        msg_rcptto_received,
        msg_invalid_cmd_data_sequence,
        msg_invalid_cmd_data_arg,
        msg_data_received,
        msg_size_is_too_big,
        msg_received,
        msg_invalid_cmd_rset_sequence,
        msg_invalid_cmd_rset_arg,
        msg_rset_received,
        msg_invalid_cmd_noop_arg,
        msg_noop_received,
        msg_invalid_cmd_quit_arg,
    );

    /// Resolve every unset attribute to its default
    pub fn build(self) -> Configuration {
        let message_size_limit = self
            .message_size_limit
            .filter(|limit| *limit != 0)
            .unwrap_or(Defaults::MESSAGE_SIZE_LIMIT);

        Configuration {
            host_address: resolve(self.host_address, Defaults::HOST_ADDRESS),
            port_number: self.port_number.unwrap_or(Defaults::PORT_NUMBER),
            log_to_stdout: self.log_to_stdout,
            log_server_activity: self.log_server_activity,
            fail_fast: self.fail_fast,
            session_timeout: self
                .session_timeout
                .filter(|timeout| !timeout.is_zero())
                .unwrap_or(Defaults::SESSION_TIMEOUT),
            message_size_limit,
            delays: self.delays,

            blacklisted_helo_domains: self.blacklisted_helo_domains,
            blacklisted_mailfrom_emails: self.blacklisted_mailfrom_emails,
            blacklisted_rcptto_emails: self.blacklisted_rcptto_emails,
            not_registered_emails: self.not_registered_emails,

            msg_greeting: resolve(self.msg_greeting, Defaults::GREETING_MSG),
            msg_invalid_cmd: resolve(self.msg_invalid_cmd, Defaults::INVALID_CMD_MSG),
            msg_quit_cmd: resolve(self.msg_quit_cmd, Defaults::QUIT_CMD_MSG),

            msg_invalid_cmd_helo_sequence: resolve(
                self.msg_invalid_cmd_helo_sequence,
                Defaults::INVALID_CMD_HELO_SEQUENCE_MSG,
            ),
            msg_invalid_cmd_helo_arg: resolve(
                self.msg_invalid_cmd_helo_arg,
                Defaults::INVALID_CMD_HELO_ARG_MSG,
            ),
            msg_helo_received: resolve(self.msg_helo_received, Defaults::HELO_RECEIVED_MSG),

            msg_invalid_cmd_mailfrom_sequence: resolve(
                self.msg_invalid_cmd_mailfrom_sequence,
                Defaults::INVALID_CMD_MAILFROM_SEQUENCE_MSG,
            ),
            msg_invalid_cmd_mailfrom_arg: resolve(
                self.msg_invalid_cmd_mailfrom_arg,
                Defaults::INVALID_CMD_MAILFROM_ARG_MSG,
            ),
            msg_mailfrom_blacklisted_email: resolve(
                self.msg_mailfrom_blacklisted_email,
                Defaults::MAILFROM_BLACKLISTED_EMAIL_MSG,
            ),
            msg_mailfrom_received: resolve(
                self.msg_mailfrom_received,
                Defaults::MAILFROM_RECEIVED_MSG,
            ),

            msg_invalid_cmd_rcptto_sequence: resolve(
                self.msg_invalid_cmd_rcptto_sequence,
                Defaults::INVALID_CMD_RCPTTO_SEQUENCE_MSG,
            ),
            msg_invalid_cmd_rcptto_arg: resolve(
                self.msg_invalid_cmd_rcptto_arg,
                Defaults::INVALID_CMD_RCPTTO_ARG_MSG,
            ),
            msg_rcptto_blacklisted_email: resolve(
                self.msg_rcptto_blacklisted_email,
                Defaults::RCPTTO_BLACKLISTED_EMAIL_MSG,
            ),
            msg_rcptto_not_registered_email: resolve(
                self.msg_rcptto_not_registered_email,
                Defaults::RCPTTO_NOT_REGISTERED_EMAIL_MSG,
            ),
            msg_rcptto_received: resolve(self.msg_rcptto_received, Defaults::RCPTTO_RECEIVED_MSG),

            msg_invalid_cmd_data_sequence: resolve(
                self.msg_invalid_cmd_data_sequence,
                Defaults::INVALID_CMD_DATA_SEQUENCE_MSG,
            ),
            msg_invalid_cmd_data_arg: resolve(
                self.msg_invalid_cmd_data_arg,
                Defaults::INVALID_CMD_DATA_ARG_MSG,
            ),
            msg_data_received: resolve(self.msg_data_received, Defaults::DATA_RECEIVED_MSG),

            msg_size_is_too_big: self
                .msg_size_is_too_big
                .filter(|msg| !msg.is_empty())
                .unwrap_or_else(|| Defaults::msg_size_is_too_big(message_size_limit)),
            msg_received: resolve(self.msg_received, Defaults::MSG_RECEIVED_MSG),

            msg_invalid_cmd_rset_sequence: resolve(
                self.msg_invalid_cmd_rset_sequence,
                Defaults::INVALID_CMD_RSET_SEQUENCE_MSG,
            ),
            msg_invalid_cmd_rset_arg: resolve(
                self.msg_invalid_cmd_rset_arg,
                Defaults::INVALID_CMD_RSET_ARG_MSG,
            ),
            msg_rset_received: resolve(self.msg_rset_received, Defaults::RSET_RECEIVED_MSG),

            msg_invalid_cmd_noop_arg: resolve(
                self.msg_invalid_cmd_noop_arg,
                Defaults::INVALID_CMD_NOOP_ARG_MSG,
            ),
            msg_noop_received: resolve(self.msg_noop_received, Defaults::NOOP_RECEIVED_MSG),

            msg_invalid_cmd_quit_arg: resolve(
                self.msg_invalid_cmd_quit_arg,
                Defaults::INVALID_CMD_QUIT_ARG_MSG,
            ),
        }
    }
}

// Empty strings count as unset so every response line stays non-empty.
fn resolve(value: Option<String>, default: &str) -> String {
    value
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();

        assert_eq!(config.host_address, "127.0.0.1");
        assert_eq!(config.port_number, 0);
        assert!(!config.log_to_stdout);
        assert!(!config.log_server_activity);
        assert!(!config.fail_fast);
        assert_eq!(config.session_timeout, Duration::from_secs(30));
        assert_eq!(config.message_size_limit, 10_485_760);
        assert_eq!(config.delays, ResponseDelays::default());
        assert!(config.blacklisted_helo_domains.is_empty());
        assert!(config.not_registered_emails.is_empty());

        assert_eq!(config.msg_greeting, "220 Welcome");
        assert_eq!(config.msg_invalid_cmd, "500 Invalid command");
        assert_eq!(config.msg_quit_cmd, "221 Bye");
        assert_eq!(config.msg_received, "250 Received");
        assert_eq!(config.msg_rcptto_not_registered_email, "550 User not found");
        assert_eq!(
            config.msg_size_is_too_big,
            "552 Message exceeded max size of 10485760 bytes"
        );
    }

    #[test]
    fn test_every_message_is_non_empty() {
        let config = Configuration::builder()
            .msg_greeting("")
            .msg_quit_cmd("")
            .build();

        let messages = [
            &config.msg_greeting,
            &config.msg_invalid_cmd,
            &config.msg_quit_cmd,
            &config.msg_invalid_cmd_helo_sequence,
            &config.msg_invalid_cmd_helo_arg,
            &config.msg_helo_received,
            &config.msg_invalid_cmd_mailfrom_sequence,
            &config.msg_invalid_cmd_mailfrom_arg,
            &config.msg_mailfrom_blacklisted_email,
            &config.msg_mailfrom_received,
            &config.msg_invalid_cmd_rcptto_sequence,
            &config.msg_invalid_cmd_rcptto_arg,
            &config.msg_rcptto_blacklisted_email,
            &config.msg_rcptto_not_registered_email,
            &config.msg_rcptto_received,
            &config.msg_invalid_cmd_data_sequence,
            &config.msg_invalid_cmd_data_arg,
            &config.msg_data_received,
            &config.msg_size_is_too_big,
            &config.msg_received,
            &config.msg_invalid_cmd_rset_sequence,
            &config.msg_invalid_cmd_rset_arg,
            &config.msg_rset_received,
            &config.msg_invalid_cmd_noop_arg,
            &config.msg_noop_received,
            &config.msg_invalid_cmd_quit_arg,
        ];
        assert!(messages.iter().all(|message| !message.is_empty()));
        assert_eq!(config.msg_greeting, Defaults::GREETING_MSG);
        assert_eq!(config.msg_quit_cmd, Defaults::QUIT_CMD_MSG);
    }

    #[test]
    fn test_explicit_values_are_preserved() {
        let delays = ResponseDelays {
            helo: Duration::from_millis(5),
            quit: Duration::from_millis(7),
            ..Default::default()
        };
        let config = Configuration::builder()
            .host_address("0.0.0.0")
            .port_number(2525)
            .log_to_stdout(true)
            .log_server_activity(true)
            .fail_fast(true)
            .session_timeout(Duration::from_secs(2))
            .message_size_limit(42)
            .response_delays(delays)
            .blacklisted_helo_domains(["spam.example"])
            .blacklisted_mailfrom_emails(vec!["bad@example.com".to_string()])
            .blacklisted_rcptto_emails(["victim@example.com"])
            .not_registered_emails(["ghost@example.com"])
            .msg_greeting("220 Custom greeting")
            .msg_received("250 Queued")
            .msg_size_is_too_big("552 Nope")
            .build();

        assert_eq!(config.bind_address(), "0.0.0.0:2525");
        assert!(config.log_to_stdout);
        assert!(config.log_server_activity);
        assert!(config.fail_fast);
        assert_eq!(config.session_timeout, Duration::from_secs(2));
        assert_eq!(config.message_size_limit, 42);
        assert_eq!(config.delays, delays);
        assert_eq!(config.msg_greeting, "220 Custom greeting");
        assert_eq!(config.msg_received, "250 Queued");
        assert_eq!(config.msg_size_is_too_big, "552 Nope");
        assert!(config.blacklisted_helo_domains.contains("spam.example"));
        assert!(config.blacklisted_mailfrom_emails.contains("bad@example.com"));
        assert!(config.blacklisted_rcptto_emails.contains("victim@example.com"));
        assert!(config.not_registered_emails.contains("ghost@example.com"));
    }

    #[test]
    fn test_size_message_uses_resolved_limit() {
        let config = Configuration::builder().message_size_limit(1024).build();
        assert_eq!(
            config.msg_size_is_too_big,
            "552 Message exceeded max size of 1024 bytes"
        );
    }

    #[test]
    fn test_zero_timeout_falls_back_to_default() {
        let config = Configuration::builder()
            .session_timeout(Duration::ZERO)
            .build();
        assert_eq!(config.session_timeout, Defaults::SESSION_TIMEOUT);
    }

    #[test]
    fn test_zero_size_limit_falls_back_to_default() {
        let config = Configuration::builder().message_size_limit(0).build();
        assert_eq!(config.message_size_limit, Defaults::MESSAGE_SIZE_LIMIT);
        assert_eq!(
            config.msg_size_is_too_big,
            "552 Message exceeded max size of 10485760 bytes"
        );
    }

    #[test]
    fn test_membership_ignores_ascii_case() {
        let config = Configuration::builder()
            .blacklisted_helo_domains(["Spam.Example"])
            .blacklisted_mailfrom_emails(["bad@example.com"])
            .blacklisted_rcptto_emails(["victim@example.com"])
            .not_registered_emails(["ghost@example.com"])
            .build();

        assert!(config.is_blacklisted_helo_domain("spam.example"));
        assert!(config.is_blacklisted_mailfrom_email("BAD@example.com"));
        assert!(config.is_blacklisted_rcptto_email("victim@EXAMPLE.com"));
        assert!(config.is_not_registered_email("ghost@example.com"));
        assert!(!config.is_not_registered_email("someone@example.com"));
    }
}
