//! Catalog reference data: categories and lab tests.
//!
//! The content service delivers records in two naming conventions
//! (`categoryId`/`nameEn` and `category`/`name_en`), with ids as either
//! strings or numbers. `Raw*` types accept both; `normalize()` turns them
//! into the canonical entries the index works with.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::enums::Locale;
use super::ModelError;

/// Display names in the two supported languages. Either may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedName {
    pub en: String,
    pub ar: String,
}

impl LocalizedName {
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
        }
    }

    /// Name in `locale`, falling back to the other language when missing.
    pub fn get(&self, locale: Locale) -> Option<&str> {
        let primary = self.in_locale(locale);
        if !primary.is_empty() {
            return Some(primary);
        }
        let fallback = self.in_locale(locale.other());
        (!fallback.is_empty()).then_some(fallback)
    }

    fn in_locale(&self, locale: Locale) -> &str {
        match locale {
            Locale::En => &self.en,
            Locale::Ar => &self.ar,
        }
    }

    fn is_empty(&self) -> bool {
        self.en.trim().is_empty() && self.ar.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub id: String,
    pub name: LocalizedName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCatalogEntry {
    pub id: String,
    pub code: String,
    pub category_id: String,
    pub name: LocalizedName,
}

// ═══════════════════════════════════════════════════════════
// Raw records (ingestion shapes)
// ═══════════════════════════════════════════════════════════
//
// Every field is optional and both spellings are separate fields, so a
// record only fails at `normalize()`. Where both spellings are present the
// camelCase one wins.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCategoryRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, rename = "nameEn")]
    pub name_en_camel: Option<String>,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default, rename = "nameAr")]
    pub name_ar_camel: Option<String>,
    #[serde(default)]
    pub name_ar: Option<String>,
}

impl RawCategoryRecord {
    pub fn normalize(self) -> Result<CategoryEntry, ModelError> {
        let id = present(self.id).ok_or(ModelError::MissingId)?;
        let name = LocalizedName::new(
            either(self.name_en_camel, self.name_en),
            either(self.name_ar_camel, self.name_ar),
        );
        if name.is_empty() {
            return Err(ModelError::MissingName { id });
        }
        Ok(CategoryEntry { id, name })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTestRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, rename = "categoryId", deserialize_with = "lenient_id")]
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub category: Option<String>,
    #[serde(default, rename = "nameEn")]
    pub name_en_camel: Option<String>,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default, rename = "nameAr")]
    pub name_ar_camel: Option<String>,
    #[serde(default)]
    pub name_ar: Option<String>,
}

impl RawTestRecord {
    /// Canonical entry. `categoryId` wins over `category` when both exist.
    pub fn normalize(self) -> Result<TestCatalogEntry, ModelError> {
        let id = present(self.id).ok_or(ModelError::MissingId)?;
        let category_id = present(self.category_id)
            .or_else(|| present(self.category))
            .ok_or_else(|| ModelError::MissingCategory { id: id.clone() })?;

        let name = LocalizedName::new(
            either(self.name_en_camel, self.name_en),
            either(self.name_ar_camel, self.name_ar),
        );
        if name.is_empty() {
            return Err(ModelError::MissingName { id });
        }

        Ok(TestCatalogEntry {
            id,
            code: self.code.unwrap_or_default(),
            category_id,
            name,
        })
    }
}

/// Non-blank value, trimmed.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn either(preferred: Option<String>, other: Option<String>) -> String {
    present(preferred).or_else(|| present(other)).unwrap_or_default()
}

/// Ids arrive as strings or numbers. Anything else (null, bool, object)
/// reads as absent and is rejected by `normalize()`.
fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
            _ => n.to_string(),
        }),
        _ => None,
    })
}
