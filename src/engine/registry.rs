//! Security-id keyed instrument registry with the per-packet dirty set.
//!
//! The symbol table is loaded once at startup; instrument state is created
//! lazily the first time a message references the id. The dirty set records
//! which instruments a packet touched so the boundary handlers walk only
//! those.

use std::collections::{BTreeMap, HashMap, btree_map};
use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, trace};

use super::error::AnalyzerError;
use super::security::SecurityState;

/// A message referenced a security id missing from the symbol file; the
/// entry is skipped.
#[derive(Debug, Clone, Copy, Error)]
#[error("security id {0} is not present in the symbol file")]
pub struct UnknownSecurity(pub i32);

/// One line of the symbol file.
#[derive(Debug, Clone)]
struct SymbolEntry {
    symbol: String,
    price_shift: i64,
    tick_size: i64,
}

/// Lazily populated map from security id to instrument state.
#[derive(Debug, Default)]
pub struct SecurityRegistry {
    symbols: HashMap<i32, SymbolEntry>,
    securities: BTreeMap<i32, SecurityState>,
    packet_dirty: Vec<i32>,
    min_sweep_depth: i64,
}

impl SecurityRegistry {
    /// Load the symbol table from `path`. Each line is
    /// `symbol,exchange_id,price_shift,tick_size`; blank or malformed
    /// lines are skipped.
    pub fn from_symbol_file(
        path: impl AsRef<Path>,
        min_sweep_depth: i64,
    ) -> Result<Self, AnalyzerError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| AnalyzerError::SymbolFile {
            path: path.to_path_buf(),
            source,
        })?;

        let mut registry = Self {
            min_sweep_depth,
            ..Self::default()
        };
        for line in contents.lines() {
            let mut fields = line.split(',');
            let (Some(symbol), Some(id), Some(shift), Some(tick)) = (
                fields.next(),
                fields.next(),
                fields.next(),
                fields.next(),
            ) else {
                continue;
            };
            let (Ok(id), Ok(price_shift), Ok(tick_size)) = (
                id.trim().parse::<i32>(),
                shift.trim().parse::<i64>(),
                tick.trim().parse::<i64>(),
            ) else {
                trace!(line, "skipping malformed symbol line");
                continue;
            };
            registry.symbols.insert(
                id,
                SymbolEntry {
                    symbol: symbol.to_string(),
                    price_shift,
                    tick_size,
                },
            );
        }
        debug!(
            path = %path.display(),
            symbols = registry.symbols.len(),
            "loaded symbol table"
        );
        Ok(registry)
    }

    /// Build a registry from in-memory symbol rows, for tests and embedding.
    pub fn from_symbols<I>(rows: I, min_sweep_depth: i64) -> Self
    where
        I: IntoIterator<Item = (i32, String, i64, i64)>,
    {
        let symbols = rows
            .into_iter()
            .map(|(id, symbol, price_shift, tick_size)| {
                (
                    id,
                    SymbolEntry {
                        symbol,
                        price_shift,
                        tick_size,
                    },
                )
            })
            .collect();
        Self {
            symbols,
            securities: BTreeMap::new(),
            packet_dirty: Vec::new(),
            min_sweep_depth,
        }
    }

    /// Fetch the instrument for `sec_id`, creating it on first reference,
    /// and mark it dirty for the current packet (append-once).
    pub fn touch(&mut self, sec_id: i32) -> Result<&mut SecurityState, UnknownSecurity> {
        let entry = match self.securities.entry(sec_id) {
            btree_map::Entry::Occupied(occupied) => occupied.into_mut(),
            btree_map::Entry::Vacant(vacant) => {
                let Some(known) = self.symbols.get(&sec_id) else {
                    return Err(UnknownSecurity(sec_id));
                };
                trace!(sec_id, symbol = %known.symbol, "instrument first touch");
                vacant.insert(SecurityState::new(
                    sec_id,
                    known.symbol.clone(),
                    known.price_shift,
                    known.tick_size,
                    self.min_sweep_depth,
                ))
            }
        };

        if !entry.dirty {
            entry.dirty = true;
            self.packet_dirty.push(sec_id);
        }
        Ok(entry)
    }

    /// The instrument for `sec_id`, if it has been touched before.
    pub fn get(&self, sec_id: i32) -> Option<&SecurityState> {
        self.securities.get(&sec_id)
    }

    /// Mutable access to the instrument for `sec_id`, if it exists.
    pub fn get_mut(&mut self, sec_id: i32) -> Option<&mut SecurityState> {
        self.securities.get_mut(&sec_id)
    }

    /// Security ids dirtied by the current packet, in touch order.
    pub fn packet_dirty(&self) -> &[i32] {
        &self.packet_dirty
    }

    /// The most recently dirtied security id of the current packet.
    pub fn last_dirty(&self) -> Option<i32> {
        self.packet_dirty.last().copied()
    }

    /// End-of-packet cleanup: clear every dirty flag and empty the set.
    pub fn clear_packet(&mut self) {
        for sec_id in self.packet_dirty.drain(..) {
            if let Some(security) = self.securities.get_mut(&sec_id) {
                security.dirty = false;
            }
        }
    }

    /// Number of instruments instantiated so far.
    pub fn len(&self) -> usize {
        self.securities.len()
    }

    /// True when no instrument has been touched yet.
    pub fn is_empty(&self) -> bool {
        self.securities.is_empty()
    }

    /// Consume the registry for end-of-run emission, ascending security id.
    pub fn into_securities(self) -> impl Iterator<Item = SecurityState> {
        self.securities.into_values()
    }
}
