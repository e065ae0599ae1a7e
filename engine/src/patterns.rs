//! Pattern catalog: the per-category keyword/sender/subject/body/domain
//! tables driving the additive scoring in [`crate::classify`] and
//! [`crate::newsletter`]. Loaded once from `config/patterns.toml` and
//! immutable for the process lifetime.

use std::{env, path::Path};

use config::Config;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::error::{AppError, AppResult};

// Scoring weights. Subject hits outweigh body hits; an explicit
// sender prefix is the strongest single signal.
const BODY_KEYWORD_WEIGHT: i32 = 2;
const SUBJECT_KEYWORD_WEIGHT: i32 = 3;
const SENDER_PREFIX_WEIGHT: i32 = 4;
const SUBJECT_PATTERN_WEIGHT: i32 = 3;
const BODY_PATTERN_WEIGHT: i32 = 2;
const DOMAIN_PATTERN_WEIGHT: i32 = 3;

/// Closed set of categories an email can be filed under.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EmailCategory {
    Newsletter,
    Social,
    Promotional,
    Work,
    Personal,
    Finance,
    Travel,
    Shopping,
    Support,
    Spam,
    Important,
    Todo,
    Other,
}

/// Pattern lists for a single category, as declared in patterns.toml.
/// All lists are lowercase substrings; `sender_patterns` are matched
/// as prefixes of the sender address.
#[derive(Debug, Clone)]
pub struct CategoryPatterns {
    pub category: EmailCategory,
    pub keywords: Vec<String>,
    pub sender_patterns: Vec<String>,
    pub subject_patterns: Vec<String>,
    pub body_patterns: Vec<String>,
    pub domain_patterns: Vec<String>,
}

/// Outcome of scoring one email against one category's patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternScore {
    pub score: i32,
    /// Human-readable descriptions of every hit, in match order.
    pub matched: Vec<String>,
}

impl CategoryPatterns {
    /// Additive scoring pass. All matches accumulate; a pattern absent
    /// from the text simply contributes nothing. Inputs are expected
    /// to be lowercased by the caller.
    pub fn score(&self, subject: &str, body: &str, sender: &str) -> PatternScore {
        let mut result = PatternScore::default();

        for keyword in &self.keywords {
            if subject.contains(keyword.as_str()) {
                result.score += SUBJECT_KEYWORD_WEIGHT;
                result.matched.push(format!("subject keyword \"{keyword}\""));
            }
            if body.contains(keyword.as_str()) {
                result.score += BODY_KEYWORD_WEIGHT;
                result.matched.push(format!("body keyword \"{keyword}\""));
            }
        }
        for pattern in &self.sender_patterns {
            if sender.starts_with(pattern.as_str()) {
                result.score += SENDER_PREFIX_WEIGHT;
                result.matched.push(format!("sender prefix \"{pattern}\""));
            }
        }
        for pattern in &self.subject_patterns {
            if subject.contains(pattern.as_str()) {
                result.score += SUBJECT_PATTERN_WEIGHT;
                result.matched.push(format!("subject pattern \"{pattern}\""));
            }
        }
        for pattern in &self.body_patterns {
            if body.contains(pattern.as_str()) {
                result.score += BODY_PATTERN_WEIGHT;
                result.matched.push(format!("body pattern \"{pattern}\""));
            }
        }
        for pattern in &self.domain_patterns {
            if sender.contains(pattern.as_str()) {
                result.score += DOMAIN_PATTERN_WEIGHT;
                result.matched.push(format!("sender domain \"{pattern}\""));
            }
        }

        result
    }
}

// Raw file shape; the category name is parsed into the enum after
// deserialization so a typo fails loudly with the offending name.
#[derive(Debug, Deserialize)]
struct RawCategoryPatterns {
    category: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    sender_patterns: Vec<String>,
    #[serde(default)]
    subject_patterns: Vec<String>,
    #[serde(default)]
    body_patterns: Vec<String>,
    #[serde(default)]
    domain_patterns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    categories: Vec<RawCategoryPatterns>,
}

/// Immutable, ordered catalog of per-category pattern sets. Iteration
/// order is the declaration order in patterns.toml, which doubles as
/// the deterministic tie-break order during classification.
#[derive(Debug)]
pub struct PatternCatalog {
    entries: Vec<CategoryPatterns>,
}

impl PatternCatalog {
    /// Load the catalog from `config/patterns.toml`, resolved against
    /// `APP_DIR` when set and the workspace root otherwise.
    pub fn load() -> AppResult<Self> {
        let root = env::var("APP_DIR").unwrap_or_else(|_| {
            let dir =
                env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR or APP_DIR is required");
            let dir = Path::new(&dir).parent().unwrap().display().to_string();
            format!("{}/config", dir)
        });
        let path = format!("{root}/patterns.toml");
        let file: CatalogFile = Config::builder()
            .add_source(config::File::with_name(&path))
            .build()?
            .try_deserialize()?;

        let entries = file
            .categories
            .into_iter()
            .map(|raw| {
                let category = raw.category.parse::<EmailCategory>().map_err(|_| {
                    AppError::Catalog(format!("unknown category \"{}\"", raw.category))
                })?;
                Ok(CategoryPatterns {
                    category,
                    keywords: raw.keywords,
                    sender_patterns: raw.sender_patterns,
                    subject_patterns: raw.subject_patterns,
                    body_patterns: raw.body_patterns,
                    domain_patterns: raw.domain_patterns,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let catalog = Self { entries };
        catalog.check_complete()?;
        Ok(catalog)
    }

    /// Every category must have exactly one entry, even if empty.
    fn check_complete(&self) -> AppResult<()> {
        for category in EmailCategory::iter() {
            let count = self
                .entries
                .iter()
                .filter(|e| e.category == category)
                .count();
            if count != 1 {
                return Err(AppError::Catalog(format!(
                    "patterns.toml must declare category \"{category}\" exactly once, found {count}"
                )));
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> &[CategoryPatterns] {
        &self.entries
    }

    pub fn get(&self, category: EmailCategory) -> &CategoryPatterns {
        self.entries
            .iter()
            .find(|e| e.category == category)
            .unwrap_or_else(|| panic!("catalog is missing category {category}"))
    }
}

lazy_static! {
    /// Process-scoped catalog singleton, loaded on first use.
    pub static ref CATALOG: PatternCatalog =
        PatternCatalog::load().expect("config/patterns.toml is required");
}
