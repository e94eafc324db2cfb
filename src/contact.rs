//! Contact form: field validation and the mail-client draft link.
//!
//! Nothing is sent anywhere. A valid form turns into a `mailto:` URL that
//! the host hands to the operating system.

use std::fmt;
use std::fmt::Write as _;

/// Inbox every draft is addressed to.
pub const CONTACT_ADDRESS: &str = "hello@runvault.demo";

/// Accepted topic values.
pub const TOPICS: [&str; 4] = ["Product Sizing", "Order Status", "Partnership", "Other"];

const MIN_NAME_CHARS: usize = 2;
const MIN_MESSAGE_CHARS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    Topic,
    Message,
}

/// One failed field rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldError {
    NameTooShort,
    EmailMissingAt,
    TopicMissing,
    TopicUnknown,
    MessageTooShort,
}

impl FieldError {
    pub fn field(self) -> Field {
        match self {
            Self::NameTooShort => Field::Name,
            Self::EmailMissingAt => Field::Email,
            Self::TopicMissing | Self::TopicUnknown => Field::Topic,
            Self::MessageTooShort => Field::Message,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameTooShort => write!(f, "Name must be at least {} characters", MIN_NAME_CHARS),
            Self::EmailMissingAt => f.write_str("Please enter a valid email"),
            Self::TopicMissing => f.write_str("Please select a topic"),
            Self::TopicUnknown => f.write_str("Unknown topic"),
            Self::MessageTooShort => write!(f, "Message must be at least {} characters", MIN_MESSAGE_CHARS),
        }
    }
}

/// Raw form input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub topic: String,
    pub message: String,
}

impl ContactForm {
    /// Every failed rule, in field order. Empty when the form is valid.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.name.chars().count() < MIN_NAME_CHARS {
            errors.push(FieldError::NameTooShort);
        }
        if !self.email.contains('@') {
            errors.push(FieldError::EmailMissingAt);
        }
        if self.topic.is_empty() {
            errors.push(FieldError::TopicMissing);
        } else if !TOPICS.contains(&self.topic.as_str()) {
            errors.push(FieldError::TopicUnknown);
        }
        if self.message.chars().count() < MIN_MESSAGE_CHARS {
            errors.push(FieldError::MessageTooShort);
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    pub fn subject(&self) -> String {
        format!("[RUNVAULT] {} - {}", self.topic, self.name)
    }

    pub fn body(&self) -> String {
        format!("From: {} ({})\n\nMessage:\n{}", self.name, self.email, self.message)
    }

    /// Draft link for a valid form; the field errors otherwise.
    pub fn mailto_link(&self) -> Result<String, Vec<FieldError>> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(format!(
            "mailto:{}?subject={}&body={}",
            CONTACT_ADDRESS,
            encode_uri_component(&self.subject()),
            encode_uri_component(&self.body())
        ))
    }
}

/// Percent-encode everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`,
/// byte-wise over UTF-8.
pub fn encode_uri_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || b"-_.!~*'()".contains(&b) {
            out.push(b as char);
        } else {
            let _ = write!(out, "%{:02X}", b);
        }
    }
    out
}
