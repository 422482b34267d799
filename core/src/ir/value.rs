//! SSA values and materialized constants.

use serde::{Deserialize, Serialize};

use super::shader::InstId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueId(pub u32);

impl std::fmt::Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Shape and producer of one SSA value. Every value has exactly one
/// producing instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsaDef {
    pub num_components: u8,
    pub bit_size: u8,
    pub producer: InstId,
}

/// A literal with the same shape as the source constant it came from.
///
/// Components are kept as raw bit patterns so that readers see exactly
/// what lowering wrote, including the all-ones boolean `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constant {
    Numeric {
        bit_size: u8,
        columns: u8,
        rows: u8,
        /// Column-major bit patterns, `columns * rows` entries.
        bits: Vec<u64>,
    },
    /// Array elements or struct members.
    Aggregate(Vec<Constant>),
}

/// The internal encoding of boolean `true`.
pub const TRUE_BITS: u64 = 0xffff_ffff;
pub const FALSE_BITS: u64 = 0;

impl Constant {
    pub fn component(&self, column: u8, row: u8) -> Option<u64> {
        match self {
            Constant::Numeric { columns, rows, bits, .. } => {
                if column >= *columns || row >= *rows {
                    return None;
                }
                bits.get(column as usize * *rows as usize + row as usize).copied()
            }
            Constant::Aggregate(_) => None,
        }
    }

    pub fn element(&self, index: usize) -> Option<&Constant> {
        match self {
            Constant::Aggregate(elements) => elements.get(index),
            Constant::Numeric { .. } => None,
        }
    }

    pub fn bit_size(&self) -> Option<u8> {
        match self {
            Constant::Numeric { bit_size, .. } => Some(*bit_size),
            Constant::Aggregate(_) => None,
        }
    }
}

impl std::fmt::Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constant::Numeric { bit_size, bits, .. } => {
                write!(f, "(")?;
                for (i, b) in bits.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    let width = (*bit_size as usize).div_ceil(4);
                    write!(f, "0x{:0width$x}", b, width = width)?;
                }
                write!(f, ")")
            }
            Constant::Aggregate(elements) => {
                write!(f, "{{")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "}}")
            }
        }
    }
}
