//! Standalone newsletter detection: scores an email against the
//! newsletter pattern set and pulls unsubscribe links out of
//! HTML-ish bodies. Consumed on its own and by the classifier.

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::patterns::{EmailCategory, CATALOG};

/// Links whose href mentions an opt-out mechanism.
static UNSUBSCRIBE_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)href\s*=\s*"([^"]*(?:unsubscribe|opt-out|remove)[^"]*)""#).unwrap()
});

/// Newsletter score above which detection fires even without an
/// unsubscribe link.
const SCORE_THRESHOLD: i32 = 5;

/// Bonus applied to the confidence score when an unsubscribe link is
/// present.
const UNSUBSCRIBE_BONUS: i32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterDetection {
    pub is_newsletter: bool,
    pub confidence: f32,
    pub unsubscribe_links: Vec<String>,
    /// Reserved for a future sender-history collaborator.
    pub sender_reputation: String,
    pub frequency: String,
}

/// Score newsletter likelihood for the given message text. Inputs may
/// be raw; lowercasing happens internally.
pub fn detect(subject: &str, body: &str, sender: &str) -> NewsletterDetection {
    let subject_lower = subject.to_lowercase();
    let body_lower = body.to_lowercase();
    let sender_lower = sender.to_lowercase();

    let score = CATALOG
        .get(EmailCategory::Newsletter)
        .score(&subject_lower, &body_lower, &sender_lower)
        .score;

    let unsubscribe_links = extract_unsubscribe_links(body);
    let has_unsubscribe = !unsubscribe_links.is_empty();
    let bonus = if has_unsubscribe { UNSUBSCRIBE_BONUS } else { 0 };

    NewsletterDetection {
        is_newsletter: score > SCORE_THRESHOLD || has_unsubscribe,
        confidence: (((score + bonus) as f32) / 10.0).min(1.0),
        unsubscribe_links,
        sender_reputation: "unknown".to_string(),
        frequency: "unknown".to_string(),
    }
}

/// Pull all opt-out style hrefs out of the body, preserving the order
/// of first appearance and dropping duplicates.
pub fn extract_unsubscribe_links(body: &str) -> Vec<String> {
    let mut links: IndexSet<String> = IndexSet::new();
    for capture in UNSUBSCRIBE_LINK_RE.captures_iter(body) {
        links.insert(capture[1].to_string());
    }
    links.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsubscribe_link_flags_newsletter() {
        let body = r#"<a href="https://x.com/unsubscribe?x=1">Unsubscribe</a>"#;
        let detection = detect("", body, "");
        assert!(detection.is_newsletter);
        assert!(detection
            .unsubscribe_links
            .contains(&"https://x.com/unsubscribe?x=1".to_string()));
    }

    #[test]
    fn test_links_deduplicated_in_order() {
        let body = r#"
            <a href="https://a.com/unsubscribe">one</a>
            <a href="https://b.com/opt-out">two</a>
            <a href="https://a.com/unsubscribe">again</a>
        "#;
        let links = extract_unsubscribe_links(body);
        assert_eq!(
            links,
            vec![
                "https://a.com/unsubscribe".to_string(),
                "https://b.com/opt-out".to_string()
            ]
        );
    }

    #[test]
    fn test_href_matching_is_case_insensitive() {
        let body = r#"<a HREF="https://x.com/UNSUBSCRIBE">bye</a>"#;
        let links = extract_unsubscribe_links(body);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0], "https://x.com/UNSUBSCRIBE");
    }

    #[test]
    fn test_high_pattern_score_without_links() {
        let detection = detect(
            "Weekly Newsletter: March Edition",
            "plain text digest, no links here",
            "newsletter@example.com",
        );
        assert!(detection.is_newsletter);
        assert!(detection.unsubscribe_links.is_empty());
        assert!(detection.confidence > 0.5);
    }

    #[test]
    fn test_plain_mail_is_not_newsletter() {
        let detection = detect("Lunch tomorrow?", "Want to grab lunch?", "friend@example.com");
        assert!(!detection.is_newsletter);
        assert_eq!(detection.confidence, 0.0);
    }

    #[test]
    fn test_confidence_bounded_to_one() {
        let body = r#"unsubscribe digest weekly monthly edition newsletter
            <a href="https://x.com/unsubscribe">x</a> view in browser mailing list"#;
        let detection = detect("weekly newsletter digest monthly edition", body, "newsletter@x.com");
        assert!(detection.confidence <= 1.0);
        assert!(detection.is_newsletter);
    }
}
