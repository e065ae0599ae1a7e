use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const MIN_MAX_TOKENS: usize = 1000;
pub const MAX_MAX_TOKENS: usize = 10000;
pub const MIN_BATCH_SIZE: usize = 1;
pub const MAX_BATCH_SIZE: usize = 50;

/// Rough chars-per-token factor used to bound the text each engine
/// examines per email.
const CHARS_PER_TOKEN: usize = 4;

/// Tunable processing options, supplied at engine construction and
/// updatable at runtime through [`SharedConfig::update`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessingConfig {
    pub enable_categorization: bool,
    pub enable_todo_extraction: bool,
    pub enable_newsletter_detection: bool,
    pub max_tokens_per_email: usize,
    pub confidence_threshold: f32,
    pub batch_size: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            enable_categorization: true,
            enable_todo_extraction: true,
            enable_newsletter_detection: true,
            max_tokens_per_email: 4000,
            confidence_threshold: 0.3,
            batch_size: 10,
        }
    }
}

impl ProcessingConfig {
    pub fn validate(&self) -> AppResult<()> {
        if !(MIN_MAX_TOKENS..=MAX_MAX_TOKENS).contains(&self.max_tokens_per_email) {
            return Err(AppError::InvalidConfig(format!(
                "max_tokens_per_email must be within [{}, {}], got {}",
                MIN_MAX_TOKENS, MAX_MAX_TOKENS, self.max_tokens_per_email
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(AppError::InvalidConfig(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(AppError::InvalidConfig(format!(
                "batch_size must be within [{}, {}], got {}",
                MIN_BATCH_SIZE, MAX_BATCH_SIZE, self.batch_size
            )));
        }
        Ok(())
    }

    /// Character budget for the working text of a single email.
    pub fn max_chars(&self) -> usize {
        self.max_tokens_per_email * CHARS_PER_TOKEN
    }
}

/// Partial update merged field-by-field into an existing config.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessingConfigUpdate {
    pub enable_categorization: Option<bool>,
    pub enable_todo_extraction: Option<bool>,
    pub enable_newsletter_detection: Option<bool>,
    pub max_tokens_per_email: Option<usize>,
    pub confidence_threshold: Option<f32>,
    pub batch_size: Option<usize>,
}

/// Config handle shared between the engines and the batch
/// coordinator. Reads take a snapshot at the start of each call;
/// concurrent updates are last-writer-wins and are not synchronized
/// with in-flight batches.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    inner: Arc<RwLock<ProcessingConfig>>,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(ProcessingConfig::default())),
        }
    }
}

impl SharedConfig {
    pub fn new(config: ProcessingConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(RwLock::new(config)),
        })
    }

    pub fn snapshot(&self) -> ProcessingConfig {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Merge a partial update into the current config. The merged
    /// result is validated as a whole before it replaces the old one.
    pub fn update(&self, update: ProcessingConfigUpdate) -> AppResult<ProcessingConfig> {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut merged = guard.clone();
        if let Some(v) = update.enable_categorization {
            merged.enable_categorization = v;
        }
        if let Some(v) = update.enable_todo_extraction {
            merged.enable_todo_extraction = v;
        }
        if let Some(v) = update.enable_newsletter_detection {
            merged.enable_newsletter_detection = v;
        }
        if let Some(v) = update.max_tokens_per_email {
            merged.max_tokens_per_email = v;
        }
        if let Some(v) = update.confidence_threshold {
            merged.confidence_threshold = v;
        }
        if let Some(v) = update.batch_size {
            merged.batch_size = v;
        }
        merged.validate()?;
        *guard = merged.clone();
        Ok(merged)
    }
}
