//! Per-statement profile aggregation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BlockIoRow, CpuRow, MemoryRow};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatementProfile {
    pub cpu_rows: Vec<CpuRow>,
    pub total_cpu_user: Decimal,
    pub total_cpu_system: Decimal,
    /// False when the engine returned no CPU rows; totals are then zero but
    /// must not be presented as measured.
    pub cpu_available: bool,
    pub memory_rows: Vec<MemoryRow>,
    pub total_memory: Decimal,
    /// True only when at least one row carried an allocation figure.
    pub memory_available: bool,
    /// Informational only, never summed.
    pub block_io_rows: Vec<BlockIoRow>,
}

impl StatementProfile {
    pub fn has_block_io(&self) -> bool {
        !self.block_io_rows.is_empty()
    }
}

/// Folds the three category row sets of one statement into a profile.
///
/// Row order is kept as the engine returned it.
pub fn aggregate(
    cpu_rows: Vec<CpuRow>,
    memory_rows: Vec<MemoryRow>,
    block_io_rows: Vec<BlockIoRow>,
) -> StatementProfile {
    let total_cpu_user = cpu_rows.iter().map(|r| r.cpu_user).sum::<Decimal>();
    let total_cpu_system = cpu_rows.iter().map(|r| r.cpu_system).sum::<Decimal>();
    let total_memory = memory_rows
        .iter()
        .filter_map(|r| r.allocation)
        .sum::<Decimal>();

    StatementProfile {
        cpu_available: !cpu_rows.is_empty(),
        memory_available: memory_rows.iter().any(|r| r.allocation.is_some()),
        cpu_rows,
        total_cpu_user,
        total_cpu_system,
        memory_rows,
        total_memory,
        block_io_rows,
    }
}
