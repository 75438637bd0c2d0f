//! Prelude module that re-exports the types most programs need.
//!
//! ```rust
//! use mdp_sleuth::prelude::*;
//! ```

// Book structures
pub use crate::book::{BookSide, InstrumentBook, Level, MAX_LEVELS, SideKind};

// Detectors and their events
pub use crate::detector::{
    Aggressor, Iceberg, IcebergTracker, StopsChain, StopsTracker, StopsTrade, SweepEvent,
    SweepTracker,
};

// Engine types
pub use crate::engine::{
    AnalyzerError, Dispatcher, RunStats, SecurityRegistry, SecurityState, UnknownSecurity,
};

// Feed input
pub use crate::feed::{ErfReader, ErfRecord, FeedError, Indicator};

// Report output
pub use crate::report::{IcebergRecord, Reports, StopsRecord, SweepRecord};

// Run entry points
pub use crate::{DEFAULT_SYMBOL_FILE, RunConfig, run};
