// Fusion Module - concurrent fetch, cache fallback, merge
//
// Adapters → resolve (live | cached | unavailable) → pure merge → repository

pub mod adapters;
pub mod engine;
pub mod merge;

pub use engine::{FusionEngine, ScanRequest, ScanSources};
pub use merge::{merge, MergeInputs, ScanContext};

use crate::models::Provenance;

/// Outcome of one data source after fallback
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<T> {
    /// Fetched during this scan
    Live(T),
    /// Fetch failed, last-known value recovered from cache
    Cached(T),
    /// No scan location; fetched for the default coordinates and never cached
    Regional(T),
    /// Fetch failed and nothing was cached
    Unavailable,
}

impl<T> Resolved<T> {
    pub fn provenance(&self) -> Provenance {
        match self {
            Resolved::Live(_) => Provenance::Live,
            Resolved::Cached(_) => Provenance::Cached,
            Resolved::Regional(_) => Provenance::Regional,
            Resolved::Unavailable => Provenance::Default,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Resolved::Live(value) | Resolved::Cached(value) | Resolved::Regional(value) => {
                Some(value)
            }
            Resolved::Unavailable => None,
        }
    }
}
