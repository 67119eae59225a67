//! API shapes: the [`Gig`] returned to callers and the contact [`Message`]
//! accepted from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const NAME_MAX: usize = 100;
const SUBJECT_MAX: usize = 200;
const MESSAGE_MAX: usize = 5000;

/// One scheduled performance, always fully populated.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Gig {
    pub title: String,
    pub venue: String,
    pub city: String,
    pub date: DateTime<Utc>,
    pub ticket_url: Option<String>,
    pub is_confirmed: bool,
}

/// A contact-form submission.
///
/// Deserialization checks structure; [`Message::validate`] checks content.
/// Neither coerces: a message that fails either is rejected as a whole.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Message {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

/// One rejected field, addressed the way clients see it (`["body", "email"]`).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
}

impl FieldError {
    pub fn new(loc: &[&str], msg: impl Into<String>) -> Self {
        Self { loc: loc.iter().map(|s| s.to_string()).collect(), msg: msg.into() }
    }
}

/// Every problem found in one request, reported together.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{} invalid field(s)", .0.len())]
pub struct ValidationError(pub Vec<FieldError>);

impl Message {
    /// Parses and validates a JSON request body.
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
        let message: Message = serde_json::from_slice(body)
            .map_err(|e| ValidationError(vec![FieldError::new(&["body"], e.to_string())]))?;
        message.validate()?;
        Ok(message)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        check_text(&mut errors, "name", &self.name, NAME_MAX);
        if !is_plausible_email(&self.email) {
            errors.push(FieldError::new(&["body", "email"], "value is not a valid email address"));
        }
        if let Some(subject) = &self.subject {
            if subject.chars().count() > SUBJECT_MAX {
                errors.push(FieldError::new(
                    &["body", "subject"],
                    format!("should have at most {SUBJECT_MAX} characters"),
                ));
            }
        }
        check_text(&mut errors, "message", &self.message, MESSAGE_MAX);

        if errors.is_empty() { Ok(()) } else { Err(ValidationError(errors)) }
    }
}

fn check_text(errors: &mut Vec<FieldError>, field: &str, value: &str, max: usize) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(&["body", field], "must not be blank"));
    } else if value.chars().count() > max {
        errors.push(FieldError::new(&["body", field], format!("should have at most {max} characters")));
    }
}

/// `local@domain.tld`, no whitespace, exactly one `@`.
fn is_plausible_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else { return false };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
