//! Catalog query parameters.

use serde::{Deserialize, Deserializer};

/// Parameters accepted by the catalog listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    /// Case-insensitive title substring.
    #[serde(default)]
    pub q: Option<String>,

    /// Exact category name; the all-category sentinel disables the filter.
    #[serde(default)]
    pub cat: Option<String>,

    /// Shuffle matches. Only the literal value `true` enables it.
    #[serde(default, deserialize_with = "literal_true")]
    pub random: bool,

    #[serde(default)]
    pub offset: Option<usize>,

    #[serde(default)]
    pub limit: Option<usize>,
}

fn literal_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.as_deref() == Some("true"))
}
