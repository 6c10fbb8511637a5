//! Immutable in-memory catalog snapshot.
//!
//! # Responsibilities
//! - Read every configured category data file once, at startup
//! - Normalize raw entries into [`MediaRecord`]s
//! - Answer filtered, paginated and grouped queries
//!
//! # Design Decisions
//! - No interior mutability; shared between handlers via `Arc<Catalog>`
//! - A broken or missing data file never prevents the others from loading

use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use thiserror::Error;

use crate::catalog::model::{CatalogPage, CategoryCount, MediaRecord, RawEntry};
use crate::catalog::query::CatalogQuery;
use crate::config::CatalogConfig;

/// Errors raised while reading a single category file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read-only set of media records.
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<MediaRecord>,
    categories: Vec<String>,
    all_category: String,
    max_results: usize,
}

impl Catalog {
    /// Load every configured category from `config.data_dir`.
    pub fn load(config: &CatalogConfig) -> Self {
        let dir = Path::new(&config.data_dir);
        let mut records = Vec::new();

        for source in &config.categories {
            let path = dir.join(&source.file);
            if !path.exists() {
                tracing::info!(category = %source.name, path = %path.display(), "Category file not found, skipping");
                continue;
            }
            match read_category(&path, &source.name) {
                Ok(mut loaded) => {
                    tracing::info!(category = %source.name, count = loaded.len(), "Category loaded");
                    records.append(&mut loaded);
                }
                Err(e) => {
                    tracing::error!(category = %source.name, error = %e, "Failed to load category");
                }
            }
        }

        tracing::info!(total = records.len(), "Catalog loaded");
        Self::from_records(config, records)
    }

    /// Build a snapshot from already-normalized records.
    pub fn from_records(config: &CatalogConfig, records: Vec<MediaRecord>) -> Self {
        Self {
            records,
            categories: config.categories.iter().map(|c| c.name.clone()).collect(),
            all_category: config.all_category.clone(),
            max_results: config.max_results,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Filter, optionally shuffle, then paginate.
    pub fn query(&self, query: &CatalogQuery) -> CatalogPage {
        // An empty `cat` is a category name like any other and matches nothing.
        let category = query.cat.as_deref().filter(|c| *c != self.all_category);
        let needle = query
            .q
            .as_deref()
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let mut matches: Vec<&MediaRecord> = self
            .records
            .iter()
            .filter(|r| category.map_or(true, |c| r.category == c))
            .filter(|r| {
                needle
                    .as_deref()
                    .map_or(true, |n| r.title.to_lowercase().contains(n))
            })
            .collect();

        if query.random {
            matches.shuffle(&mut rand::thread_rng());
        }

        let limit = query
            .limit
            .map_or(self.max_results, |l| l.min(self.max_results));
        let offset = query.offset.unwrap_or(0);

        CatalogPage {
            total: matches.len(),
            data: matches
                .into_iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect(),
        }
    }

    /// Record counts per category, led by the all-category sentinel.
    pub fn categories(&self) -> Vec<CategoryCount> {
        let mut counts = Vec::with_capacity(self.categories.len() + 1);
        counts.push(CategoryCount {
            name: self.all_category.clone(),
            count: self.records.len(),
        });
        for name in &self.categories {
            counts.push(CategoryCount {
                name: name.clone(),
                count: self.records.iter().filter(|r| &r.category == name).count(),
            });
        }
        counts
    }
}

fn read_category(path: &Path, category: &str) -> Result<Vec<MediaRecord>, CatalogError> {
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<RawEntry> =
        serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| entry.into_record(category, i))
        .collect())
}
