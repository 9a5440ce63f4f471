//! Facet core types shared by the search, persistence and engine crates.
//!
//! - `Record`: a host-supplied JSON object projected once through a `FieldMap`
//! - `CategoryCounts`: per-category tallies plus the synthetic "All" total
//! - `EngineMode`: which count set is authoritative for presentation
//! - `EngineConfig`: every tunable the engine reads

#![forbid(unsafe_code)]

pub mod config;
pub mod counts;
pub mod error;
pub mod record;

use serde::{Deserialize, Serialize};

pub use config::{EngineConfig, FilterMode};
pub use counts::CategoryCounts;
pub use error::{Error, Result};
pub use record::{FieldMap, Projector, Record, RecordId, UNCATEGORIZED};

/// Pipeline mode. `Initial` reads the unfiltered counts; the other two read the filtered set.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EngineMode {
    /// No active query.
    #[default]
    Initial,
    /// A query of sufficient length has produced, or is awaiting, a filtered set.
    Filtering,
    /// Non-empty query below the minimum length.
    TooShort,
}

impl EngineMode {
    pub fn is_initial(self) -> bool {
        matches!(self, EngineMode::Initial)
    }
}
