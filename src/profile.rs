//! Typed rows of the engine's per-stage profiling output.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProfileCategory {
    Cpu,
    Memory,
    BlockIo,
}

impl ProfileCategory {
    /// `SHOW PROFILE` type keyword for this category.
    pub fn show_profile_type(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Memory => "MEMORY",
            Self::BlockIo => "BLOCK IO",
        }
    }
}

impl fmt::Display for ProfileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::BlockIo => "block_io",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CpuRow {
    pub stage: String,
    pub duration: Decimal,
    pub cpu_user: Decimal,
    pub cpu_system: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryRow {
    pub stage: String,
    pub duration: Decimal,
    /// `None` when the engine reports no allocation column.
    pub allocation: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockIoRow {
    pub stage: String,
    pub duration: Decimal,
    pub reads: u64,
    pub writes: u64,
}

impl BlockIoRow {
    /// Time attributed to the stage's block operations.
    pub fn io_time(&self) -> Decimal {
        self.duration
    }
}

/// One stage row as returned by a profiling retrieval, tagged by category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ProfileRow {
    Cpu(CpuRow),
    Memory(MemoryRow),
    BlockIo(BlockIoRow),
}

impl ProfileRow {
    pub fn category(&self) -> ProfileCategory {
        match self {
            Self::Cpu(_) => ProfileCategory::Cpu,
            Self::Memory(_) => ProfileCategory::Memory,
            Self::BlockIo(_) => ProfileCategory::BlockIo,
        }
    }
}

/// Narrows a tagged row to one category's row type.
pub trait CategoryRow: Sized {
    const CATEGORY: ProfileCategory;

    fn from_row(row: ProfileRow) -> Option<Self>;
}

impl CategoryRow for CpuRow {
    const CATEGORY: ProfileCategory = ProfileCategory::Cpu;

    fn from_row(row: ProfileRow) -> Option<Self> {
        match row {
            ProfileRow::Cpu(r) => Some(r),
            _ => None,
        }
    }
}

impl CategoryRow for MemoryRow {
    const CATEGORY: ProfileCategory = ProfileCategory::Memory;

    fn from_row(row: ProfileRow) -> Option<Self> {
        match row {
            ProfileRow::Memory(r) => Some(r),
            _ => None,
        }
    }
}

impl CategoryRow for BlockIoRow {
    const CATEGORY: ProfileCategory = ProfileCategory::BlockIo;

    fn from_row(row: ProfileRow) -> Option<Self> {
        match row {
            ProfileRow::BlockIo(r) => Some(r),
            _ => None,
        }
    }
}
