//! Todo extraction: segments email text into sentences and explicit
//! list items, matches them against the action keyword tiers, and
//! produces deduplicated, confidence-filtered todo items.

mod due_date;

pub use due_date::extract_due_date;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{
    config::SharedConfig,
    message::{truncate_chars, EmailMessage},
};

/// Priority assigned to a todo or a whole message, ordered from
/// least to most pressing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    Snoozed,
}

/// An extracted action item. Produced as a provisional candidate,
/// surviving items are what the caller persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: TodoStatus,
    pub due_date: Option<NaiveDate>,
    pub confidence: f32,
    /// Original source snippet the item was extracted from.
    pub context: String,
    pub action_keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoExtractionResult {
    pub todos: Vec<TodoItem>,
    pub has_todos: bool,
    pub confidence: f32,
    pub reasoning: String,
}

// Action keyword tiers, checked in priority order. The first tier
// with any hit decides priority and confidence for a sentence.
const URGENT_KEYWORDS: &[&str] = &["urgent", "asap", "immediately", "emergency"];
const DEADLINE_KEYWORDS: &[&str] = &["deadline", "due", "expires", "critical", "important"];
const REQUEST_KEYWORDS: &[&str] = &["please review", "need to", "action required", "follow up"];
const SOFT_KEYWORDS: &[&str] = &["when you get a chance", "whenever", "if possible"];

const ACTION_TIERS: &[(&[&str], Priority, f32)] = &[
    (URGENT_KEYWORDS, Priority::Urgent, 0.9),
    (DEADLINE_KEYWORDS, Priority::High, 0.8),
    (REQUEST_KEYWORDS, Priority::Medium, 0.7),
    (SOFT_KEYWORDS, Priority::Low, 0.6),
];

/// Fallback for sentences without tier keywords: an imperative verb
/// at the start (optionally behind a politeness prefix) or a modal
/// request anywhere.
static IMPERATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:please\s+|kindly\s+)?(review|send|complete|finish|update|check|verify|confirm|schedule|call|email|submit|prepare|fix)\b",
    )
    .unwrap()
});
static MODAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(need to|have to|must|should|could you|would you|can you)\b").unwrap());

// Explicit list markers, matched per line.
static CHECKBOX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*•]\s*)?\[([ xX])\]\s*(.+)$").unwrap());
static NUMBERED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\.\s+(.+)$").unwrap());
static BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-*•]\s+(.+)$").unwrap());

/// Broader vocabulary used to decide whether a list item looks
/// actionable at all.
const LIST_ACTION_VOCAB: &[&str] = &[
    "review", "send", "complete", "finish", "update", "check", "verify", "confirm", "schedule",
    "call", "email", "submit", "prepare", "fix", "follow up", "need to", "must", "should", "due",
    "deadline", "action", "task", "remember", "don't forget",
];

const POLITENESS_PREFIXES: &[&str] = &["please ", "kindly ", "could you ", "can you ", "would you "];

const MIN_SENTENCE_LEN: usize = 10;
const MAX_SENTENCE_LEN: usize = 200;
const TITLE_MAX_LEN: usize = 60;
const SIGNATURE_MAX_LEN: usize = 50;
const LIST_ITEM_CONFIDENCE: f32 = 0.7;

/// Heuristic todo extraction engine. Stateless apart from the shared
/// processing config, which is read at the start of every call.
#[derive(Debug, Clone)]
pub struct TodoExtractor {
    config: SharedConfig,
}

impl TodoExtractor {
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    /// Extract action items from a message. Never fails; messages
    /// without any text yield an empty result whose reasoning notes
    /// the failure.
    pub fn extract(&self, msg: &EmailMessage) -> TodoExtractionResult {
        let cfg = self.config.snapshot();

        if msg.is_empty_text() {
            tracing::warn!(email_id = %msg.id, "todo extraction skipped: no message text");
            return TodoExtractionResult {
                todos: vec![],
                has_todos: false,
                confidence: 0.0,
                reasoning: "Todo extraction failed: message has no subject or body".to_string(),
            };
        }

        let text = format!("{} {}", msg.subject_str(), msg.body_str());
        let text = truncate_chars(&text, cfg.max_chars());

        let mut candidates = sentence_candidates(text);
        candidates.extend(list_candidates(text));

        let mut todos = deduplicate(candidates);
        todos.retain(|todo| todo.confidence >= cfg.confidence_threshold);

        let confidence = if todos.is_empty() {
            0.0
        } else {
            todos.iter().map(|t| t.confidence).sum::<f32>() / todos.len() as f32
        };

        let reasoning = if todos.is_empty() {
            "No actionable items found".to_string()
        } else {
            let clauses: Vec<String> = todos
                .iter()
                .map(|t| {
                    format!(
                        "\"{}\" ({}, keywords: {})",
                        t.title,
                        t.priority,
                        t.action_keywords.join(", ")
                    )
                })
                .collect();
            format!("Extracted {} todo(s): {}", todos.len(), clauses.join("; "))
        };

        tracing::debug!(email_id = %msg.id, count = todos.len(), "todo extraction finished");

        TodoExtractionResult {
            has_todos: !todos.is_empty(),
            confidence,
            reasoning,
            todos,
        }
    }
}

/// Sentence-level pass: split on terminal punctuation and run each
/// surviving fragment through the action tiers.
fn sentence_candidates(text: &str) -> Vec<TodoItem> {
    let mut candidates = Vec::new();

    for fragment in text.split(['.', '!', '?']) {
        let trimmed = fragment.trim();
        let len = trimmed.chars().count();
        if len <= MIN_SENTENCE_LEN || len > MAX_SENTENCE_LEN {
            continue;
        }

        let lower = trimmed.to_lowercase();
        let matched = match_action_tier(&lower).or_else(|| {
            match_imperative(&lower).map(|keywords| (Priority::Medium, 0.6, keywords))
        });

        if let Some((priority, confidence, keywords)) = matched {
            candidates.push(build_candidate(
                trimmed,
                priority,
                confidence,
                keywords,
                TodoStatus::Pending,
            ));
        }
    }

    candidates
}

/// Explicit-list pass: numbered, bulleted and checkbox lines anywhere
/// in the text, accepted when their content carries action
/// vocabulary. Checked checkboxes come out already completed.
fn list_candidates(text: &str) -> Vec<TodoItem> {
    let mut candidates = Vec::new();

    for line in text.lines() {
        let (content, status) = if let Some(cap) = CHECKBOX_RE.captures(line) {
            let status = if cap[1].eq_ignore_ascii_case("x") {
                TodoStatus::Completed
            } else {
                TodoStatus::Pending
            };
            (cap[2].trim().to_string(), status)
        } else if let Some(cap) = NUMBERED_RE.captures(line) {
            (cap[1].trim().to_string(), TodoStatus::Pending)
        } else if let Some(cap) = BULLET_RE.captures(line) {
            let content = cap[1].trim();
            // A bullet whose content opens a bracket is a malformed
            // checkbox, not a plain item.
            if content.starts_with('[') {
                continue;
            }
            (content.to_string(), TodoStatus::Pending)
        } else {
            continue;
        };

        if content.chars().count() < 4 {
            continue;
        }

        let lower = content.to_lowercase();
        let keywords: Vec<String> = LIST_ACTION_VOCAB
            .iter()
            .filter(|vocab| lower.contains(*vocab))
            .map(|vocab| vocab.to_string())
            .collect();
        if keywords.is_empty() {
            continue;
        }

        candidates.push(build_candidate(
            &content,
            Priority::Medium,
            LIST_ITEM_CONFIDENCE,
            keywords,
            status,
        ));
    }

    candidates
}

/// First tier with any hit wins; all of that tier's matched keywords
/// are recorded.
fn match_action_tier(lower: &str) -> Option<(Priority, f32, Vec<String>)> {
    for (keywords, priority, confidence) in ACTION_TIERS {
        let hits: Vec<String> = keywords
            .iter()
            .filter(|keyword| lower.contains(*keyword))
            .map(|keyword| keyword.to_string())
            .collect();
        if !hits.is_empty() {
            return Some((*priority, *confidence, hits));
        }
    }
    None
}

fn match_imperative(lower: &str) -> Option<Vec<String>> {
    if let Some(cap) = IMPERATIVE_RE.captures(lower) {
        return Some(vec![cap[1].to_string()]);
    }
    MODAL_RE
        .find(lower)
        .map(|hit| vec![hit.as_str().to_string()])
}

fn build_candidate(
    raw: &str,
    priority: Priority,
    confidence: f32,
    action_keywords: Vec<String>,
    status: TodoStatus,
) -> TodoItem {
    let context = raw.trim().to_string();
    let cleaned = strip_politeness(&context);
    let cleaned = cleaned.trim_end_matches(['.', '!', '?', ',', ';', ':']).trim();
    let description = capitalize(cleaned);
    let title = truncate_title(&description);
    let due_date = extract_due_date(&context);

    TodoItem {
        title,
        description,
        priority,
        status,
        due_date,
        confidence,
        context,
        action_keywords,
    }
}

/// Strip leading politeness prefixes ("please ", "could you ", ...),
/// repeating so "could you please review" reduces to "review".
fn strip_politeness(text: &str) -> &str {
    let mut rest = text.trim();
    loop {
        let lower = rest.to_lowercase();
        let Some(prefix) = POLITENESS_PREFIXES
            .iter()
            .find(|prefix| lower.starts_with(*prefix))
        else {
            return rest;
        };
        rest = rest[prefix.len()..].trim_start();
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Bound titles to 60 chars, ellipsis included.
fn truncate_title(text: &str) -> String {
    if text.chars().count() <= TITLE_MAX_LEN {
        return text.to_string();
    }
    let head: String = text.chars().take(TITLE_MAX_LEN - 3).collect();
    format!("{}...", head.trim_end())
}

/// Drop later candidates whose normalized title+description signature
/// repeats an earlier one.
fn deduplicate(candidates: Vec<TodoItem>) -> Vec<TodoItem> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::new();

    for candidate in candidates {
        let normalized: String = format!("{}_{}", candidate.title, candidate.description)
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .take(SIGNATURE_MAX_LEN)
            .collect();
        if seen.insert(normalized) {
            kept.push(candidate);
        }
    }

    kept
}
