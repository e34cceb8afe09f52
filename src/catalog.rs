//! Test catalog index: filter and search over the category and test lists
//! supplied by the content service.
//!
//! Built once per session. All queries are pure: no I/O, no caching.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{
    CategoryEntry, Locale, RawCategoryRecord, RawTestRecord, TestCatalogEntry,
};

/// Sentinel category id meaning "every category".
pub const ALL_CATEGORIES: &str = "all";

/// Active category filter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFilter {
    #[default]
    All,
    Category(String),
}

impl CategoryFilter {
    /// Parse a filter id as the UI sends it; `"all"` is the sentinel.
    pub fn parse(id: &str) -> Self {
        if id == ALL_CATEGORIES {
            Self::All
        } else {
            Self::Category(id.to_string())
        }
    }

    fn admits(&self, test: &TestCatalogEntry) -> bool {
        match self {
            Self::All => true,
            Self::Category(id) => test.category_id == *id,
        }
    }
}

/// Filterable projection over the catalog.
#[derive(Debug, Clone, Default)]
pub struct TestCatalogIndex {
    categories: Vec<CategoryEntry>,
    tests: Vec<TestCatalogEntry>,
}

impl TestCatalogIndex {
    /// Index already-normalized entries. Source order is kept.
    pub fn new(categories: Vec<CategoryEntry>, tests: Vec<TestCatalogEntry>) -> Self {
        Self { categories, tests }
    }

    /// Normalize raw content-service records and index them.
    ///
    /// Records that cannot be normalized are skipped with a warning.
    pub fn from_raw(categories: Vec<RawCategoryRecord>, tests: Vec<RawTestRecord>) -> Self {
        let categories: Vec<CategoryEntry> = categories
            .into_iter()
            .filter_map(|raw| match raw.normalize() {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping catalog category");
                    None
                }
            })
            .collect();

        let tests: Vec<TestCatalogEntry> = tests
            .into_iter()
            .filter_map(|raw| match raw.normalize() {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping catalog test");
                    None
                }
            })
            .collect();

        debug!(
            categories = categories.len(),
            tests = tests.len(),
            "Catalog indexed"
        );

        Self::new(categories, tests)
    }

    /// Parse the content-service JSON arrays directly.
    ///
    /// Only a document that is not a JSON array fails. Elements that do not
    /// decode as a record are skipped with a warning, like records that do
    /// not normalize.
    pub fn from_json(categories: &str, tests: &str) -> Result<Self, serde_json::Error> {
        let categories: Vec<Value> = serde_json::from_str(categories)?;
        let tests: Vec<Value> = serde_json::from_str(tests)?;
        Ok(Self::from_raw(
            decode_records(categories, "category"),
            decode_records(tests, "test"),
        ))
    }

    pub fn categories(&self) -> &[CategoryEntry] {
        &self.categories
    }

    pub fn tests(&self) -> &[TestCatalogEntry] {
        &self.tests
    }

    pub fn get(&self, id: &str) -> Option<&TestCatalogEntry> {
        self.tests.iter().find(|t| t.id == id)
    }

    /// Tests passing the category filter and the free-text query, in source
    /// order.
    ///
    /// The query (trimmed) matches case-insensitively against the English
    /// name, the Arabic name, or the code as a substring. An empty query
    /// matches everything.
    pub fn filter(&self, category: &CategoryFilter, query: &str) -> Vec<&TestCatalogEntry> {
        let needle = query.trim().to_lowercase();
        self.tests
            .iter()
            .filter(|t| category.admits(t))
            .filter(|t| needle.is_empty() || matches_query(t, &needle))
            .collect()
    }

    /// Display label for a test id in `locale`.
    ///
    /// Falls back to the other language, then the code. `None` if the id is
    /// not in the catalog.
    pub fn label(&self, id: &str, locale: Locale) -> Option<String> {
        let test = self.get(id)?;
        Some(
            test.name
                .get(locale)
                .map(str::to_string)
                .unwrap_or_else(|| test.code.clone()),
        )
    }

    /// Labels for a list of ids. Ids missing from the catalog are passed
    /// through unchanged.
    pub fn labels(&self, ids: &[String], locale: Locale) -> Vec<String> {
        ids.iter()
            .map(|id| self.label(id, locale).unwrap_or_else(|| id.clone()))
            .collect()
    }

    pub fn category_label(&self, id: &str, locale: Locale) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .and_then(|c| c.name.get(locale))
    }

    /// Resolve a deep-link hint to a test id: exact id match first, then
    /// case-insensitive code match.
    pub fn resolve_deep_link(&self, hint: &str) -> Option<&str> {
        let hint = hint.trim();
        if hint.is_empty() {
            return None;
        }
        self.tests
            .iter()
            .find(|t| t.id == hint)
            .or_else(|| {
                self.tests
                    .iter()
                    .find(|t| !t.code.is_empty() && t.code.eq_ignore_ascii_case(hint))
            })
            .map(|t| t.id.as_str())
    }
}

fn decode_records<T: DeserializeOwned>(values: Vec<Value>, kind: &str) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(kind, position, error = %e, "Skipping undecodable catalog record");
                None
            }
        })
        .collect()
}

fn matches_query(test: &TestCatalogEntry, needle: &str) -> bool {
    test.name.en.to_lowercase().contains(needle)
        || test.name.ar.to_lowercase().contains(needle)
        || test.code.to_lowercase().contains(needle)
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
