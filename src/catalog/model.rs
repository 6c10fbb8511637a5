//! Catalog record types.

use serde::{Deserialize, Serialize};

/// Title used when a data file entry has none.
pub const UNTITLED: &str = "Sin título";

/// A single playable media entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: String,
    pub title: String,
    #[serde(rename = "poster")]
    pub poster_url: String,
    #[serde(rename = "url")]
    pub source_url: String,
    pub category: String,
}

/// An entry as it appears in a category data file.
///
/// Every field is optional; missing values are filled in by
/// [`RawEntry::into_record`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl RawEntry {
    /// Normalize into a record. Empty strings count as missing.
    pub fn into_record(self, category: &str, index: usize) -> MediaRecord {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        MediaRecord {
            id: format!("{category}-{index}"),
            title: present(self.title).unwrap_or_else(|| UNTITLED.to_string()),
            poster_url: present(self.logo).or(present(self.poster)).unwrap_or_default(),
            source_url: self.url.unwrap_or_default(),
            category: category.to_string(),
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    /// Number of matches before pagination.
    pub total: usize,
    pub data: Vec<MediaRecord>,
}

/// A category and how many records it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}
