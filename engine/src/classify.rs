//! Classification engine: scores an email against every category's
//! pattern set and derives category, subcategories, newsletter flag
//! and message priority.

use serde::{Deserialize, Serialize};

use crate::{
    config::SharedConfig,
    message::{truncate_chars, EmailMessage},
    newsletter,
    patterns::{CategoryPatterns, EmailCategory, PatternScore, CATALOG},
    todo::Priority,
};

/// Score above which a non-primary category is surfaced as a
/// subcategory.
const SUBCATEGORY_MIN_SCORE: i32 = 2;
const MAX_SUBCATEGORIES: usize = 3;
const MAX_REASONING_INDICATORS: usize = 3;

// Message-priority keyword tiers, checked in fixed order over
// subject and body combined.
const URGENT_PRIORITY_KEYWORDS: &[&str] = &["urgent", "asap", "emergency"];
const HIGH_PRIORITY_KEYWORDS: &[&str] = &["important", "deadline", "critical"];
const MEDIUM_PRIORITY_KEYWORDS: &[&str] = &["please", "request", "need"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub category: EmailCategory,
    /// Runner-up categories with a meaningful score, strongest first.
    pub subcategories: Vec<EmailCategory>,
    pub confidence: f32,
    pub is_newsletter: bool,
    pub priority: Option<Priority>,
    pub reasoning: String,
}

impl ClassificationResult {
    fn fallback(reasoning: impl Into<String>) -> Self {
        Self {
            category: EmailCategory::Other,
            subcategories: vec![],
            confidence: 0.0,
            is_newsletter: false,
            priority: None,
            reasoning: reasoning.into(),
        }
    }
}

/// Pattern-driven email classifier. Stateless per call; the shared
/// config is read once at the start of each classification.
#[derive(Debug, Clone)]
pub struct Classifier {
    config: SharedConfig,
}

impl Classifier {
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    /// Classify a message. Never fails; messages without any text
    /// come back as `other` with zero confidence.
    pub fn classify(&self, msg: &EmailMessage) -> ClassificationResult {
        let cfg = self.config.snapshot();

        if msg.is_empty_text() {
            tracing::warn!(email_id = %msg.id, "classification skipped: no message text");
            return ClassificationResult::fallback(
                "Classification failed: message has no subject or body",
            );
        }

        let subject = msg.subject_str().to_lowercase();
        let body = truncate_chars(msg.body_str(), cfg.max_chars()).to_lowercase();
        let sender = msg.sender_str().to_lowercase();

        let mut scored: Vec<(&CategoryPatterns, PatternScore)> = CATALOG
            .entries()
            .iter()
            .map(|entry| (entry, entry.score(&subject, &body, &sender)))
            .collect();
        // Stable sort keeps catalog order as the tie-break.
        scored.sort_by(|a, b| b.1.score.cmp(&a.1.score));

        let (primary_entry, primary_score) = &scored[0];
        let priority = detect_priority(&format!("{subject} {body}"));

        // Nothing matched at all: the winner would be arbitrary, so
        // always fall back to `other`.
        if primary_score.score == 0 {
            let detection = if cfg.enable_newsletter_detection {
                Some(newsletter::detect(msg.subject_str(), msg.body_str(), msg.sender_str()))
            } else {
                None
            };
            return ClassificationResult {
                is_newsletter: detection.map(|d| d.is_newsletter).unwrap_or(false),
                priority,
                ..ClassificationResult::fallback("No category patterns matched")
            };
        }

        let category = primary_entry.category;
        let subcategories: Vec<EmailCategory> = scored
            .iter()
            .skip(1)
            .filter(|(_, score)| score.score > SUBCATEGORY_MIN_SCORE)
            .take(MAX_SUBCATEGORIES)
            .map(|(entry, _)| entry.category)
            .collect();

        let is_newsletter = category == EmailCategory::Newsletter
            || (cfg.enable_newsletter_detection
                && newsletter::detect(msg.subject_str(), msg.body_str(), msg.sender_str())
                    .is_newsletter);

        let indicators: Vec<&str> = primary_score
            .matched
            .iter()
            .take(MAX_REASONING_INDICATORS)
            .map(String::as_str)
            .collect();
        let reasoning = format!("Matched {}: {}", category, indicators.join(", "));

        tracing::debug!(
            email_id = %msg.id,
            category = %category,
            score = primary_score.score,
            "classified email"
        );

        ClassificationResult {
            category,
            subcategories,
            confidence: (primary_score.score as f32 / 10.0).min(1.0),
            is_newsletter,
            priority,
            reasoning,
        }
    }
}

/// First matching tier wins; tiers are checked urgent, high, medium.
fn detect_priority(text: &str) -> Option<Priority> {
    let tiers = [
        (URGENT_PRIORITY_KEYWORDS, Priority::Urgent),
        (HIGH_PRIORITY_KEYWORDS, Priority::High),
        (MEDIUM_PRIORITY_KEYWORDS, Priority::Medium),
    ];
    for (keywords, priority) in tiers {
        if keywords.iter().any(|keyword| text.contains(keyword)) {
            return Some(priority);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SharedConfig;

    fn classifier() -> Classifier {
        Classifier::new(SharedConfig::default())
    }

    fn message(subject: &str, body: &str, from: &str) -> EmailMessage {
        EmailMessage {
            id: "test".to_string(),
            subject: Some(subject.to_string()),
            body: Some(body.to_string()),
            from: Some(from.to_string()),
            received_at: None,
        }
    }

    #[test]
    fn test_newsletter_end_to_end() {
        let result = classifier().classify(&message(
            "TechCrunch Weekly Newsletter",
            r#"The biggest stories of the week. Unsubscribe: <a href="https://example.com/unsubscribe">here</a>"#,
            "newsletter@techcrunch.com",
        ));
        assert_eq!(result.category, EmailCategory::Newsletter);
        assert!(result.is_newsletter);
        assert!(result.confidence > 0.5);
        assert!(result.reasoning.contains("newsletter"));
    }

    #[test]
    fn test_work_email_with_action_items() {
        let result = classifier().classify(&message(
            "Action Required: Q4 Reports Due Friday",
            "1. Finalize the Q4 revenue report before the deadline.\n\
             2. Send the draft to finance for review.\n\
             3. Confirm the submission schedule with the team.",
            "manager@corp.example.com",
        ));
        assert_eq!(result.category, EmailCategory::Work);
        assert_eq!(result.priority, Some(Priority::High));
    }

    #[test]
    fn test_empty_subject_falls_back_to_other() {
        let result = classifier().classify(&message("", "", "test@example.com"));
        assert_eq!(result.category, EmailCategory::Other);
        assert!(result.confidence >= 0.0);
        assert!(result.subcategories.is_empty());
    }

    #[test]
    fn test_missing_text_degrades_with_failure_note() {
        let msg = EmailMessage {
            id: "no-text".to_string(),
            from: Some("test@example.com".to_string()),
            ..Default::default()
        };
        let result = classifier().classify(&msg);
        assert_eq!(result.category, EmailCategory::Other);
        assert_eq!(result.confidence, 0.0);
        assert!(result.reasoning.contains("failed"));
    }

    #[test]
    fn test_priority_escalation_urgent() {
        let result = classifier().classify(&message(
            "URGENT: Fix critical bug ASAP",
            "Production is down.",
            "dev@corp.example.com",
        ));
        assert_eq!(result.priority, Some(Priority::Urgent));
    }

    #[test]
    fn test_priority_tier_order_is_fixed() {
        // "deadline" (high) and "please" (medium) both present; the
        // higher tier wins.
        let result = classifier().classify(&message(
            "Submission deadline",
            "Please send the paperwork before the deadline.",
            "admin@corp.example.com",
        ));
        assert_eq!(result.priority, Some(Priority::High));
    }

    #[test]
    fn test_no_priority_keywords_is_none() {
        let result = classifier().classify(&message(
            "Dinner on Saturday",
            "We are hosting a small party this weekend.",
            "friend@example.com",
        ));
        assert_eq!(result.priority, None);
    }

    #[test]
    fn test_unsubscribe_link_alone_sets_newsletter_flag() {
        let result = classifier().classify(&message(
            "hello",
            r#"<a href="https://x.com/unsubscribe?x=1">bye</a>"#,
            "someone@example.com",
        ));
        assert!(result.is_newsletter);
    }

    #[test]
    fn test_confidence_within_bounds() {
        let messages = [
            message("", "", ""),
            message("URGENT invoice payment overdue", "statement balance due", "billing@bank.com"),
            message(
                "weekly newsletter digest monthly edition",
                "unsubscribe view in browser mailing list",
                "newsletter@news.example.com",
            ),
        ];
        for msg in &messages {
            let result = classifier().classify(msg);
            assert!(
                (0.0..=1.0).contains(&result.confidence),
                "confidence {} out of bounds",
                result.confidence
            );
        }
    }

    #[test]
    fn test_subcategories_exclude_primary_and_weak_scores() {
        let result = classifier().classify(&message(
            "Invoice for your order",
            "Your payment receipt and tracking number are attached. Track your order online.",
            "orders@amazon.com",
        ));
        assert!(!result.subcategories.contains(&result.category));
        assert!(result.subcategories.len() <= 3);
        assert!(!result.subcategories.is_empty());
    }

    #[test]
    fn test_classification_is_idempotent() {
        let classifier = classifier();
        let msg = message(
            "Flight itinerary confirmation",
            "Your booking confirmation number is ABC123. Boarding pass attached.",
            "reservations@airline.example.com",
        );
        let first = classifier.classify(&msg);
        let second = classifier.classify(&msg);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn test_travel_category() {
        let result = classifier().classify(&message(
            "Flight itinerary for your reservation",
            "Your hotel booking and boarding pass. Confirmation number inside.",
            "reservations@booking.com",
        ));
        assert_eq!(result.category, EmailCategory::Travel);
        assert!(result.confidence > 0.5);
    }

    #[test]
    fn test_reasoning_lists_at_most_three_indicators() {
        let result = classifier().classify(&message(
            "weekly newsletter digest monthly edition",
            "unsubscribe view in browser mailing list",
            "newsletter@news.example.com",
        ));
        let indicator_count = result.reasoning.matches('"').count() / 2;
        assert!(indicator_count <= 3);
    }
}
