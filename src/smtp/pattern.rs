//! Command and argument patterns

use regex::Regex;
use std::sync::LazyLock;

const DOMAIN: &str = r"[a-z0-9_](?:[a-z0-9_-]*[a-z0-9_])?(?:\.[a-z0-9_](?:[a-z0-9_-]*[a-z0-9_])?)*";
const ADDRESS_LITERAL: &str = r"\[[0-9a-f:.]+\]";
const LOCAL_PART: &str = r"[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*";

/// `HELO` or `EHLO` followed by a space or end of line
pub static HELO_CMD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:helo|ehlo)(?: |$)").unwrap());

/// Group 1 holds the client domain or address literal
pub static HELO_ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(?:helo|ehlo) +({DOMAIN}|{ADDRESS_LITERAL}) *$"
    ))
    .unwrap()
});

pub static MAIL_FROM_CMD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^mail from:").unwrap());

/// Group 1 is the optional space, group 2 and 4 the optional angle
/// brackets, group 3 the address
pub static MAIL_FROM_ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^mail from:( ?)(<?)({LOCAL_PART}@(?:{DOMAIN}|{ADDRESS_LITERAL}))(>?) *$"
    ))
    .unwrap()
});

pub static RCPT_TO_CMD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^rcpt to:").unwrap());

/// Same group layout as [`MAIL_FROM_ARG`]
pub static RCPT_TO_ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^rcpt to:( ?)(<?)({LOCAL_PART}@(?:{DOMAIN}|{ADDRESS_LITERAL}))(>?) *$"
    ))
    .unwrap()
});

pub static DATA_CMD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^data *$").unwrap());
pub static RSET_CMD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^rset *$").unwrap());
pub static NOOP_CMD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^noop *$").unwrap());
pub static QUIT_CMD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^quit *$").unwrap());

pub const EMAIL_GROUP: usize = 3;
pub const DOMAIN_GROUP: usize = 1;

/// Check a request against a pattern
pub fn matches(text: &str, pattern: &Regex) -> bool {
    pattern.is_match(text)
}

/// Extract a capture group, `None` when the text does not match or the
/// group did not participate
pub fn capture<'t>(text: &'t str, pattern: &Regex, group: usize) -> Option<&'t str> {
    pattern
        .captures(text)
        .and_then(|captures| captures.get(group))
        .map(|found| found.as_str())
}

/// Extract the address from a `MAIL FROM`/`RCPT TO` request, rejecting
/// unbalanced angle brackets
pub fn capture_email<'t>(text: &'t str, pattern: &Regex) -> Option<&'t str> {
    let captures = pattern.captures(text)?;
    let open = captures.get(2).is_some_and(|m| !m.as_str().is_empty());
    let close = captures.get(4).is_some_and(|m| !m.as_str().is_empty());
    if open != close {
        return None;
    }
    captures.get(EMAIL_GROUP).map(|found| found.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helo_command() {
        assert!(matches("HELO example.com", &HELO_CMD));
        assert!(matches("ehlo example.com", &HELO_CMD));
        assert!(matches("HELO", &HELO_CMD));
        assert!(!matches("HELOX example.com", &HELO_CMD));
    }

    #[test]
    fn test_helo_domain_capture() {
        assert_eq!(
            capture("HELO example.com", &HELO_ARG, DOMAIN_GROUP),
            Some("example.com")
        );
        assert_eq!(
            capture("EHLO localhost", &HELO_ARG, DOMAIN_GROUP),
            Some("localhost")
        );
        assert_eq!(
            capture("EHLO [127.0.0.1]", &HELO_ARG, DOMAIN_GROUP),
            Some("[127.0.0.1]")
        );
        assert_eq!(capture("HELO", &HELO_ARG, DOMAIN_GROUP), None);
        assert_eq!(capture("HELO bad!domain", &HELO_ARG, DOMAIN_GROUP), None);
        assert_eq!(capture("HELO -leading.com", &HELO_ARG, DOMAIN_GROUP), None);
    }

    #[test]
    fn test_mail_from_variants() {
        for request in [
            "MAIL FROM:user@example.com",
            "MAIL FROM: user@example.com",
            "MAIL FROM:<user@example.com>",
            "MAIL FROM: <user@example.com>",
            "mail from:<user@example.com>",
        ] {
            assert_eq!(
                capture_email(request, &MAIL_FROM_ARG),
                Some("user@example.com"),
                "{request}"
            );
        }
    }

    #[test]
    fn test_mail_from_rejects_invalid() {
        assert_eq!(capture_email("MAIL FROM:<user@example.com", &MAIL_FROM_ARG), None);
        assert_eq!(capture_email("MAIL FROM:user@example.com>", &MAIL_FROM_ARG), None);
        assert_eq!(capture_email("MAIL FROM:", &MAIL_FROM_ARG), None);
        assert_eq!(capture_email("MAIL FROM: not-an-email", &MAIL_FROM_ARG), None);
        assert_eq!(capture_email("MAIL FROM:  a@b.com", &MAIL_FROM_ARG), None);
        assert!(matches("MAIL FROM: not-an-email", &MAIL_FROM_CMD));
        assert!(!matches("MAIL TO: a@b.com", &MAIL_FROM_CMD));
    }

    #[test]
    fn test_rcpt_to_variants() {
        assert_eq!(
            capture_email("RCPT TO:<b@example.com>", &RCPT_TO_ARG),
            Some("b@example.com")
        );
        assert_eq!(
            capture_email("rcpt to: b.c+tag@mail.example.com", &RCPT_TO_ARG),
            Some("b.c+tag@mail.example.com")
        );
        assert_eq!(capture_email("RCPT TO:<@example.com>", &RCPT_TO_ARG), None);
    }

    #[test]
    fn test_bare_commands() {
        assert!(matches("DATA", &DATA_CMD));
        assert!(matches("data", &DATA_CMD));
        assert!(!matches("DATA now", &DATA_CMD));
        assert!(matches("RSET", &RSET_CMD));
        assert!(matches("NOOP", &NOOP_CMD));
        assert!(!matches("NOOP please", &NOOP_CMD));
        assert!(matches("Quit", &QUIT_CMD));
    }
}
