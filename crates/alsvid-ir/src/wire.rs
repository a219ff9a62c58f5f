//! Wire types carried by circuit edges.

use serde::{Deserialize, Serialize};
use std::fmt;

use alsvid_types::{UnitId, UnitType};

/// The type of data flowing along a circuit edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireType {
    /// A qubit wire. Linear: exactly one producer and one consumer.
    #[serde(rename = "Q")]
    Quantum,
    /// A classical bit wire. Linear.
    #[serde(rename = "C")]
    Classical,
    /// A read-only snapshot of a bit value used as a control. Fans out
    /// from the written bit; never written itself.
    #[serde(rename = "B")]
    Boolean,
    /// An opaque WASM module state threaded for ordering. Linear.
    #[serde(rename = "W")]
    Wasm,
    /// A random-number-generator state threaded for ordering. Linear.
    #[serde(rename = "R")]
    Rng,
}

impl WireType {
    /// Linear wires demand exactly one in-edge and one out-edge per port.
    #[inline]
    pub fn is_linear(self) -> bool {
        !matches!(self, WireType::Boolean)
    }

    /// The wire type a unit's linear path carries.
    pub fn for_unit(unit: &UnitId) -> Self {
        match unit.unit_type() {
            UnitType::Qubit => WireType::Quantum,
            UnitType::Bit => WireType::Classical,
            UnitType::WasmState => WireType::Wasm,
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireType::Quantum => write!(f, "Q"),
            WireType::Classical => write!(f, "C"),
            WireType::Boolean => write!(f, "B"),
            WireType::Wasm => write!(f, "W"),
            WireType::Rng => write!(f, "R"),
        }
    }
}
