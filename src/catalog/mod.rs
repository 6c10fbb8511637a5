//! Media catalog subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     CatalogConfig (ordered category → file list)
//!     → store.rs reads each JSON file
//!     → model.rs normalizes raw entries into MediaRecords
//!     → Catalog snapshot, wrapped in Arc, handed to the HTTP layer
//!
//! Per request:
//!     query.rs (CatalogQuery from the query string)
//!     → Catalog::query (category filter → title filter → shuffle → page)
//! ```

pub mod model;
pub mod query;
pub mod store;

pub use model::{CatalogPage, CategoryCount, MediaRecord};
pub use query::CatalogQuery;
pub use store::{Catalog, CatalogError};
