//! Message records: what each connection asked for and what it was told

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// One request/response pair plus whether the command succeeded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exchange {
    pub request: String,
    pub response: String,
    pub success: bool,
}

impl Exchange {
    pub fn new(request: &str, response: &str, success: bool) -> Self {
        Self {
            request: request.to_owned(),
            response: response.to_owned(),
            success,
        }
    }
}

/// Which part of a [`Message`] a command outcome is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Helo,
    MailFrom,
    RcptTo,
    Data,
    Body,
    Rset,
}

/// Everything recorded for one SMTP connection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub helo: Exchange,
    pub mail_from: Exchange,
    pub rcpt_to: Exchange,
    pub data: Exchange,
    /// `request` holds the received body text
    pub body: Exchange,
    pub rset: Exchange,

    /// Sender extracted from the accepted `MAIL FROM`
    pub sender: Option<String>,
    /// Every accepted `RCPT TO` address, in order
    pub recipients: Vec<String>,
    pub noop_count: usize,
    pub quit_sent: bool,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// A deliverable message was fully received
    pub fn is_consistent(&self) -> bool {
        self.mail_from.success && self.rcpt_to.success && self.data.success && self.body.success
    }

    pub fn exchange(&self, slot: Slot) -> &Exchange {
        match slot {
            Slot::Helo => &self.helo,
            Slot::MailFrom => &self.mail_from,
            Slot::RcptTo => &self.rcpt_to,
            Slot::Data => &self.data,
            Slot::Body => &self.body,
            Slot::Rset => &self.rset,
        }
    }

    pub fn exchange_mut(&mut self, slot: Slot) -> &mut Exchange {
        match slot {
            Slot::Helo => &mut self.helo,
            Slot::MailFrom => &mut self.mail_from,
            Slot::RcptTo => &mut self.rcpt_to,
            Slot::Data => &mut self.data,
            Slot::Body => &mut self.body,
            Slot::Rset => &mut self.rset,
        }
    }

    /// Drop the current mail transaction, keeping the HELO state
    pub fn reset_transaction(&mut self) {
        self.mail_from = Exchange::default();
        self.rcpt_to = Exchange::default();
        self.data = Exchange::default();
        self.body = Exchange::default();
        self.sender = None;
        self.recipients.clear();
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = [
            ("HELO", &self.helo),
            ("MAIL FROM", &self.mail_from),
            ("RCPT TO", &self.rcpt_to),
            ("DATA", &self.data),
            ("RSET", &self.rset),
        ];
        for (name, exchange) in rows {
            writeln!(
                f,
                "{name}: {:?} -> {:?} (success: {})",
                exchange.request, exchange.response, exchange.success
            )?;
        }
        writeln!(
            f,
            "BODY: {} bytes -> {:?} (success: {})",
            self.body.request.len(),
            self.body.response,
            self.body.success
        )?;
        writeln!(f, "Sender: {}", self.sender.as_deref().unwrap_or("-"))?;
        writeln!(f, "Recipients: {}", self.recipients.join(", "))?;
        writeln!(f, "NOOP count: {}", self.noop_count)?;
        writeln!(f, "QUIT sent: {}", self.quit_sent)?;
        write!(f, "Consistent: {}", self.is_consistent())
    }
}

/// Shared handle to a [`Message`] that its connection keeps mutating
/// while the server store exposes snapshots of it
#[derive(Debug, Clone, Default)]
pub struct MessageHandle(Arc<Mutex<Message>>);

impl MessageHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read<T>(&self, f: impl FnOnce(&Message) -> T) -> T {
        f(&self.0.lock())
    }

    pub fn update<T>(&self, f: impl FnOnce(&mut Message) -> T) -> T {
        f(&mut self.0.lock())
    }

    pub fn snapshot(&self) -> Message {
        self.0.lock().clone()
    }
}

/// Append-only record of every accepted connection, in acceptance order
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Mutex<Vec<MessageHandle>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a record and append it before the session starts so that it
    /// is visible even if the connection fails
    pub fn new_message(&self) -> MessageHandle {
        let handle = MessageHandle::new();
        self.messages.lock().push(handle.clone());
        handle
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Message> {
        let handle = self.messages.lock().get(index).cloned()?;
        Some(handle.snapshot())
    }

    pub fn snapshots(&self) -> Vec<Message> {
        let handles = self.messages.lock().clone();
        handles.iter().map(MessageHandle::snapshot).collect()
    }

    pub fn consistent(&self) -> Vec<Message> {
        self.snapshots()
            .into_iter()
            .filter(Message::is_consistent)
            .collect()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_message() -> Message {
        Message {
            helo: Exchange::new("HELO example.com", "250 Received", true),
            mail_from: Exchange::new("MAIL FROM: a@example.com", "250 Received", true),
            rcpt_to: Exchange::new("RCPT TO: b@example.com", "250 Received", true),
            data: Exchange::new("DATA", "354 Ready", true),
            body: Exchange::new("hello", "250 Received", true),
            sender: Some("a@example.com".to_string()),
            recipients: vec!["b@example.com".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_new_message_is_empty() {
        let message = Message::new();
        assert!(!message.is_consistent());
        assert!(!message.quit_sent);
        assert_eq!(message.noop_count, 0);
        assert_eq!(message.helo, Exchange::default());
    }

    #[test]
    fn test_consistency_requires_transaction_commands() {
        let mut message = complete_message();
        assert!(message.is_consistent());

        // HELO is not part of the predicate
        message.helo.success = false;
        assert!(message.is_consistent());

        for slot in [Slot::MailFrom, Slot::RcptTo, Slot::Data, Slot::Body] {
            let mut broken = complete_message();
            broken.exchange_mut(slot).success = false;
            assert!(!broken.is_consistent(), "{slot:?}");
        }
    }

    #[test]
    fn test_reset_transaction_keeps_helo() {
        let mut message = complete_message();
        message.reset_transaction();

        assert!(message.helo.success);
        assert_eq!(message.mail_from, Exchange::default());
        assert_eq!(message.body, Exchange::default());
        assert!(message.sender.is_none());
        assert!(message.recipients.is_empty());
        assert!(!message.is_consistent());
    }

    #[test]
    fn test_display_dump() {
        let dump = complete_message().to_string();
        assert!(dump.contains("HELO: \"HELO example.com\" -> \"250 Received\" (success: true)"));
        assert!(dump.contains("BODY: 5 bytes"));
        assert!(dump.contains("Recipients: b@example.com"));
        assert!(dump.ends_with("Consistent: true"));
    }

    #[test]
    fn test_handle_updates_are_visible_to_store() {
        let store = MessageStore::new();
        let handle = store.new_message();
        assert_eq!(store.len(), 1);
        assert!(!store.get(0).unwrap().quit_sent);

        handle.update(|message| message.quit_sent = true);
        assert!(store.get(0).unwrap().quit_sent);
        assert!(handle.read(|message| message.quit_sent));
    }

    #[test]
    fn test_store_order_and_lookup() {
        let store = MessageStore::new();
        assert!(store.is_empty());

        let first = store.new_message();
        let _second = store.new_message();
        first.update(|message| message.noop_count = 3);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).unwrap().noop_count, 3);
        assert_eq!(store.get(1).unwrap().noop_count, 0);
        assert!(store.get(2).is_none());
        assert_eq!(store.snapshots().len(), 2);
    }

    #[test]
    fn test_store_consistent_filter_and_clear() {
        let store = MessageStore::new();
        store.new_message();
        let complete = store.new_message();
        complete.update(|message| *message = complete_message());

        assert_eq!(store.consistent(), vec![complete_message()]);

        store.clear();
        assert!(store.is_empty());
        assert!(store.get(0).is_none());
    }
}
