//! Network capacity per epoch and usage ratios.

/// Length of one accounting epoch in seconds.
pub const SECONDS_PER_EPOCH: u32 = 86_400;

/// Bandwidth is reported in 8-byte words.
pub const BANDWIDTH_WORD_BYTES: u64 = 8;

/// Per-block resource limits of the network.
///
/// Epoch capacity is `limit × blocks_per_second × SECONDS_PER_EPOCH`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Capacity {
    /// Maximum processing units (microseconds of CPU) per block.
    pub max_block_processing_units: u64,

    /// Maximum bandwidth per block, in bytes.
    pub max_block_bandwidth_bytes: u64,

    /// Blocks produced per second.
    pub blocks_per_second: u64,
}

impl Default for Capacity {
    fn default() -> Self {
        Self {
            max_block_processing_units: 100_000,
            max_block_bandwidth_bytes: 524_288,
            blocks_per_second: 2,
        }
    }
}

impl Capacity {
    /// Total processing units the network can absorb in one epoch.
    pub fn processing_per_epoch(&self) -> u64 {
        self.max_block_processing_units
            .saturating_mul(self.blocks_per_second)
            .saturating_mul(SECONDS_PER_EPOCH as u64)
    }

    /// Total bandwidth bytes the network can absorb in one epoch.
    pub fn bandwidth_per_epoch(&self) -> u64 {
        self.max_block_bandwidth_bytes
            .saturating_mul(self.blocks_per_second)
            .saturating_mul(SECONDS_PER_EPOCH as u64)
    }

    /// Fraction of epoch processing capacity consumed, clamped to `[0, 1]`.
    pub fn processing_ratio(&self, processing_units: u64) -> f32 {
        ratio(processing_units, self.processing_per_epoch())
    }

    /// Fraction of epoch bandwidth capacity consumed, clamped to `[0, 1]`.
    ///
    /// `bandwidth_words` is in 8-byte words.
    pub fn bandwidth_ratio(&self, bandwidth_words: u64) -> f32 {
        ratio(
            bandwidth_words.saturating_mul(BANDWIDTH_WORD_BYTES),
            self.bandwidth_per_epoch(),
        )
    }
}

fn ratio(used: u64, capacity: u64) -> f32 {
    if capacity == 0 {
        return 0.0;
    }
    (used as f32 / capacity as f32).clamp(0.0, 1.0)
}
