use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Fault};

pub const DEFAULT_SCALE: usize = 10;

/// Upper bound on addressable cells under any policy (128 MiB of `i64`).
pub const MAX_CELLS: usize = 1 << 24;

/// How much addressable memory a program gets on top of its own cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum CapacityPolicy {
    /// `factor * program length` cells, allocated up front.
    Scaled { factor: usize },
    /// Exactly `cells` cells, or the program length if that is larger.
    Fixed { cells: usize },
    /// Starts at the program length and grows on write, up to `limit` cells.
    /// Cells never written read as zero.
    Growable { limit: usize },
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self::Scaled { factor: DEFAULT_SCALE }
    }
}

impl CapacityPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Scaled { factor: 0 } => Err(ConfigError::Invalid("scale factor must be at least 1".into())),
            Self::Fixed { cells: 0 } => Err(ConfigError::Invalid("fixed capacity must be at least 1".into())),
            Self::Growable { limit: 0 } => Err(ConfigError::Invalid("growth limit must be at least 1".into())),
            Self::Scaled { factor: n } | Self::Fixed { cells: n } | Self::Growable { limit: n } if n > MAX_CELLS => {
                Err(ConfigError::Invalid(format!("{n} exceeds the {MAX_CELLS} cell ceiling")))
            }
            _ => Ok(()),
        }
    }

    /// Capacity granted to a program of `len` cells. Capped at [`MAX_CELLS`]
    /// unless the program itself is longer.
    pub fn capacity_for(&self, len: usize) -> usize {
        let requested = match *self {
            Self::Scaled { factor } => len.saturating_mul(factor),
            Self::Fixed { cells } => cells,
            Self::Growable { limit } => limit,
        };
        requested.min(MAX_CELLS).max(len)
    }
}

/// Addressable cell store. Every access is checked against `[0, capacity)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    cells: Vec<i64>,
    capacity: usize,
}

impl Memory {
    pub fn new(program: &[i64], policy: CapacityPolicy) -> Self {
        let capacity = policy.capacity_for(program.len());
        let mut cells = program.to_vec();
        if !matches!(policy, CapacityPolicy::Growable { .. }) {
            cells.resize(capacity, 0);
        }
        Self { cells, capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cells currently backed by storage. Equal to the capacity unless the
    /// memory is growable.
    pub fn cells(&self) -> &[i64] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<i64> {
        self.cells
    }

    /// Translates `address` into an index, or fails if it lies outside memory.
    pub fn check(&self, address: i64) -> Result<usize, Fault> {
        usize::try_from(address)
            .ok()
            .filter(|&index| index < self.capacity)
            .ok_or(Fault::AddressOutOfBounds { address, capacity: self.capacity })
    }

    pub fn read(&self, address: i64) -> Result<i64, Fault> {
        let index = self.check(address)?;
        Ok(self.cells.get(index).copied().unwrap_or(0))
    }

    pub fn write(&mut self, address: i64, value: i64) -> Result<(), Fault> {
        let index = self.check(address)?;
        self.store(index, value)
    }

    /// Writes to an index already validated by [`Memory::check`].
    pub(crate) fn store(&mut self, index: usize, value: i64) -> Result<(), Fault> {
        if index >= self.cells.len() {
            let cells = index + 1;
            self.cells
                .try_reserve(cells - self.cells.len())
                .map_err(|_| Fault::OutOfMemory { cells })?;
            self.cells.resize(cells, 0);
        }
        self.cells[index] = value;
        Ok(())
    }
}
