//! Database access for mitti-scan
//!
//! Table creation lives in `mitti_common::db`; this module holds the stores
//! built on those tables.

pub mod analyses;
pub mod scan_cache;

pub use analyses::{AnalysisStore, SqliteAnalysisRepository};
pub use scan_cache::SqliteCacheStore;
