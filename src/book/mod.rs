//! Price-level book structures: a depth-limited side and the four-sided
//! per-instrument book fed by incremental refresh entries.

mod instrument;
mod side;

pub use instrument::InstrumentBook;
pub use side::{BookSide, Level, MAX_LEVELS};

/// Which half of the book a level or detector belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideKind {
    /// Buy side, best price is the highest.
    Bid,
    /// Sell side, best price is the lowest.
    Ask,
}

impl SideKind {
    /// True when price `a` is closer to the market than price `b` on this side.
    #[inline]
    pub fn more_aggressive(self, a: i64, b: i64) -> bool {
        match self {
            SideKind::Bid => a > b,
            SideKind::Ask => a < b,
        }
    }
}
