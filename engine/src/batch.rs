//! Batch coordination: fans a collection of emails through the
//! classification and todo-extraction engines in fixed-size chunks,
//! joining every chunk before merging its results.

use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::{
    classify::{ClassificationResult, Classifier},
    config::SharedConfig,
    message::EmailMessage,
    todo::{TodoExtractionResult, TodoExtractor},
};

/// Merged per-email outcome handed to the persistence collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingOutcome {
    pub email_id: String,
    pub classification: Option<ClassificationResult>,
    pub todos: Option<TodoExtractionResult>,
    /// Earliest due date across the extracted todos, if any.
    pub closest_due_date: Option<NaiveDate>,
}

/// Runs both engines over email collections, `batch_size` emails at a
/// time. One email's failure never aborts the rest of the batch.
#[derive(Debug, Clone)]
pub struct BatchCoordinator {
    classifier: Arc<Classifier>,
    extractor: Arc<TodoExtractor>,
    config: SharedConfig,
}

impl BatchCoordinator {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            classifier: Arc::new(Classifier::new(config.clone())),
            extractor: Arc::new(TodoExtractor::new(config.clone())),
            config,
        }
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Classify a collection of emails, returning results keyed by
    /// email id. Returns an empty map when categorization is disabled.
    pub async fn classify_batch(
        &self,
        emails: &[EmailMessage],
    ) -> HashMap<String, ClassificationResult> {
        let cfg = self.config.snapshot();
        if !cfg.enable_categorization {
            return HashMap::new();
        }

        let mut results = HashMap::with_capacity(emails.len());
        for chunk in emails.chunks(cfg.batch_size) {
            let tasks: Vec<_> = chunk
                .iter()
                .cloned()
                .map(|email| {
                    let classifier = Arc::clone(&self.classifier);
                    tokio::task::spawn_blocking(move || {
                        (email.id.clone(), classifier.classify(&email))
                    })
                })
                .collect();

            for joined in join_all(tasks).await {
                match joined {
                    Ok((id, result)) => {
                        results.insert(id, result);
                    }
                    Err(e) => {
                        tracing::warn!("classification task failed, skipping email: {e}");
                    }
                }
            }
        }

        results
    }

    /// Extract todos for a collection of emails, keyed by email id.
    /// Returns an empty map when extraction is disabled.
    pub async fn extract_batch(
        &self,
        emails: &[EmailMessage],
    ) -> HashMap<String, TodoExtractionResult> {
        let cfg = self.config.snapshot();
        if !cfg.enable_todo_extraction {
            return HashMap::new();
        }

        let mut results = HashMap::with_capacity(emails.len());
        for chunk in emails.chunks(cfg.batch_size) {
            let tasks: Vec<_> = chunk
                .iter()
                .cloned()
                .map(|email| {
                    let extractor = Arc::clone(&self.extractor);
                    tokio::task::spawn_blocking(move || {
                        (email.id.clone(), extractor.extract(&email))
                    })
                })
                .collect();

            for joined in join_all(tasks).await {
                match joined {
                    Ok((id, result)) => {
                        results.insert(id, result);
                    }
                    Err(e) => {
                        tracing::warn!("todo extraction task failed, skipping email: {e}");
                    }
                }
            }
        }

        results
    }

    /// Run both engines and merge their results per email, in input
    /// order. Disabled engines yield `None` sides.
    pub async fn process_batch(&self, emails: &[EmailMessage]) -> Vec<ProcessingOutcome> {
        let mut classifications = self.classify_batch(emails).await;
        let mut extractions = self.extract_batch(emails).await;

        emails
            .iter()
            .map(|email| {
                let todos = extractions.remove(&email.id);
                let closest_due_date = todos.as_ref().and_then(|result| {
                    result.todos.iter().filter_map(|todo| todo.due_date).min()
                });
                ProcessingOutcome {
                    email_id: email.id.clone(),
                    classification: classifications.remove(&email.id),
                    todos,
                    closest_due_date,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProcessingConfig, ProcessingConfigUpdate};
    use crate::patterns::EmailCategory;

    fn email(id: &str, subject: &str, body: &str) -> EmailMessage {
        EmailMessage {
            id: id.to_string(),
            subject: Some(subject.to_string()),
            body: Some(body.to_string()),
            from: Some("sender@example.com".to_string()),
            received_at: None,
        }
    }

    #[tokio::test]
    async fn test_classify_batch_keys_results_by_id() {
        let coordinator = BatchCoordinator::new(SharedConfig::default());
        let emails = vec![
            email("a", "Weekly Newsletter", "unsubscribe here"),
            email("b", "Team meeting agenda", "project report attached"),
            email("c", "", ""),
        ];
        let results = coordinator.classify_batch(&emails).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results["a"].category, EmailCategory::Newsletter);
        assert_eq!(results["b"].category, EmailCategory::Work);
        assert_eq!(results["c"].category, EmailCategory::Other);
    }

    #[tokio::test]
    async fn test_batch_larger_than_chunk_size() {
        let config = SharedConfig::new(ProcessingConfig {
            batch_size: 2,
            ..Default::default()
        })
        .unwrap();
        let coordinator = BatchCoordinator::new(config);
        let emails: Vec<EmailMessage> = (0..7)
            .map(|i| email(&format!("id-{i}"), "Reminder", "Please review the attached file."))
            .collect();
        let results = coordinator.extract_batch(&emails).await;
        assert_eq!(results.len(), 7);
        for i in 0..7 {
            assert!(results[&format!("id-{i}")].has_todos);
        }
    }

    #[tokio::test]
    async fn test_malformed_email_does_not_abort_batch() {
        let coordinator = BatchCoordinator::new(SharedConfig::default());
        let emails = vec![
            EmailMessage {
                id: "broken".to_string(),
                ..Default::default()
            },
            email("fine", "URGENT: call the vendor", "This is urgent, call them today."),
        ];
        let results = coordinator.extract_batch(&emails).await;
        assert_eq!(results.len(), 2);
        assert!(!results["broken"].has_todos);
        assert!(results["broken"].reasoning.contains("failed"));
        assert!(results["fine"].has_todos);
    }

    #[tokio::test]
    async fn test_disabled_engines_yield_empty_sides() {
        let coordinator = BatchCoordinator::new(SharedConfig::default());
        coordinator
            .config()
            .update(ProcessingConfigUpdate {
                enable_categorization: Some(false),
                ..Default::default()
            })
            .unwrap();
        let emails = vec![email("a", "Weekly Newsletter", "unsubscribe here")];
        let outcomes = coordinator.process_batch(&emails).await;
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].classification.is_none());
        assert!(outcomes[0].todos.is_some());
    }

    #[tokio::test]
    async fn test_process_batch_merges_and_orders_by_input() {
        let coordinator = BatchCoordinator::new(SharedConfig::default());
        let emails = vec![
            email(
                "work-1",
                "Action Required: Q4 Reports Due Friday",
                "1. Finalize the Q4 revenue report before the deadline.\n\
                 2. Send the draft to finance for review.\n\
                 3. Confirm the submission schedule with the team.",
            ),
            email("personal-1", "Dinner party", "See you at the party this weekend."),
        ];
        let outcomes = coordinator.process_batch(&emails).await;
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].email_id, "work-1");
        assert_eq!(outcomes[1].email_id, "personal-1");

        let classification = outcomes[0].classification.as_ref().unwrap();
        assert_eq!(classification.category, EmailCategory::Work);
        let todos = outcomes[0].todos.as_ref().unwrap();
        assert!(todos.todos.len() >= 2);
        assert!(todos
            .todos
            .iter()
            .filter(|t| t.priority >= crate::todo::Priority::High)
            .count() >= 2);
    }
}
