use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw email record handed over by an upstream fetcher or API
/// caller. Subject, body and sender may all be absent; the engines
/// must degrade gracefully rather than fail.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    pub id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
}

impl EmailMessage {
    /// True when there is no text at all to work with.
    pub fn is_empty_text(&self) -> bool {
        self.subject.is_none() && self.body.is_none()
    }

    pub fn subject_str(&self) -> &str {
        self.subject.as_deref().unwrap_or("")
    }

    pub fn body_str(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    pub fn sender_str(&self) -> &str {
        self.from.as_deref().unwrap_or("")
    }
}

/// Truncate on a char boundary. Bodies can exceed the configured
/// token budget by a wide margin; everything past the cutoff is
/// ignored by the engines.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
