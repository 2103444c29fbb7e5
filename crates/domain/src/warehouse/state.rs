//! Warehouse lifecycle phases.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a warehouse.
///
/// ```text
/// Nonexistent ──open──► Open ──close──► Closed
/// ```
///
/// `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WarehousePhase {
    /// No `WarehouseOpened` event has been folded yet.
    #[default]
    Nonexistent,

    /// Stock can be stored, taken and shipped.
    Open,

    /// The warehouse was closed (terminal).
    Closed,
}

impl WarehousePhase {
    /// Returns true if stock-mutating commands are allowed.
    pub fn accepts_stock_changes(&self) -> bool {
        matches!(self, WarehousePhase::Open)
    }

    /// Returns true if the warehouse can be closed in this phase.
    pub fn can_close(&self) -> bool {
        matches!(self, WarehousePhase::Open)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WarehousePhase::Closed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WarehousePhase::Nonexistent => "Nonexistent",
            WarehousePhase::Open => "Open",
            WarehousePhase::Closed => "Closed",
        }
    }
}

impl std::fmt::Display for WarehousePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
