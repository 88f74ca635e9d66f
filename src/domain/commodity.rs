// ============================================================================
// Commodity Domain Model
// ============================================================================

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The closed set of tradable commodities.
///
/// Each commodity partitions its own order book and tags every metric the
/// engine emits. The set is fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Commodity {
    CrudeOil,
    Gold,
    Silver,
    Copper,
    NaturalGas,
}

impl Commodity {
    /// All commodities, in declaration order.
    pub const ALL: [Commodity; 5] = [
        Commodity::CrudeOil,
        Commodity::Gold,
        Commodity::Silver,
        Commodity::Copper,
        Commodity::NaturalGas,
    ];

    /// Number of commodities. Dimension of per-commodity state arrays.
    pub const COUNT: usize = Self::ALL.len();

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Commodity::CrudeOil => "Crude Oil",
            Commodity::Gold => "Gold",
            Commodity::Silver => "Silver",
            Commodity::Copper => "Copper",
            Commodity::NaturalGas => "Natural Gas",
        }
    }

    /// Short ticker symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Commodity::CrudeOil => "OIL",
            Commodity::Gold => "GOLD",
            Commodity::Silver => "SILVER",
            Commodity::Copper => "COPPER",
            Commodity::NaturalGas => "GAS",
        }
    }

    /// Dense index into per-commodity arrays.
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
