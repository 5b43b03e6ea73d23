//! Fixed five-slot inventory of untapped kegs.

use crate::error::KegError;
use crate::keg::KEG_SIZES;
use serde::Serialize;

/// Slot index of a keg size; unknown sizes are an error.
pub fn slot(keg: i32) -> Result<usize, KegError> {
    match keg {
        10 => Ok(0),
        15 => Ok(1),
        20 => Ok(2),
        30 => Ok(3),
        50 => Ok(4),
        other => Err(KegError::UnknownKeg(other)),
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct WarehouseItem {
    pub keg: i32,
    pub amount: u32,
}

/// Stock counts indexed by [`KEG_SIZES`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Warehouse {
    counts: [u32; 5],
}

impl Warehouse {
    pub fn new(counts: [u32; 5]) -> Self {
        Self { counts }
    }

    pub fn counts(&self) -> [u32; 5] {
        self.counts
    }

    pub fn count(&self, keg: i32) -> Result<u32, KegError> {
        Ok(self.counts[slot(keg)?])
    }

    pub fn increase(&mut self, keg: i32) -> Result<(), KegError> {
        let i = slot(keg)?;
        self.counts[i] = self.counts[i].saturating_add(1);
        Ok(())
    }

    /// Remove one keg; returns `false` when the slot was already empty.
    pub fn decrease(&mut self, keg: i32) -> Result<bool, KegError> {
        let i = slot(keg)?;
        if self.counts[i] == 0 {
            return Ok(false);
        }
        self.counts[i] -= 1;
        Ok(true)
    }

    /// Beers stored across all slots, two per liter.
    pub fn total_beers(&self) -> i64 {
        KEG_SIZES
            .iter()
            .zip(self.counts)
            .map(|(&keg, n)| i64::from(keg) * i64::from(n) * 2)
            .sum()
    }

    pub fn items(&self) -> Vec<WarehouseItem> {
        KEG_SIZES
            .iter()
            .zip(self.counts)
            .map(|(&keg, amount)| WarehouseItem { keg, amount })
            .collect()
    }

    /// Persisted form: five comma-separated counts in slot order.
    pub fn encode(&self) -> String {
        let [a, b, c, d, e] = self.counts;
        format!("{a},{b},{c},{d},{e}")
    }

    pub fn decode(s: &str) -> Result<Self, KegError> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 5 {
            return Err(KegError::State(format!(
                "invalid warehouse format: expected 5 counts, got {}",
                parts.len()
            )));
        }
        let mut counts = [0_u32; 5];
        for (count, part) in counts.iter_mut().zip(parts) {
            *count = part.trim().parse::<u32>().map_err(|e| {
                KegError::State(format!("invalid warehouse count {part:?}: {e}"))
            })?;
        }
        Ok(Self { counts })
    }
}
