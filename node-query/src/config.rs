//! Partition sizing for node requests

use crate::error::{Result, ValidationError};
use serde::{Deserialize, Serialize};

/// Number of nodes a single partitioned request is expected to return
pub const NODE_REQUEST_PARTITION_SIZE: u32 = 75;

/// Over-provisioning of the terms size, so that partitions with an uneven
/// share of nodes are not truncated
pub const NODE_REQUEST_PARTITION_FACTOR: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartitionConfig {
    /// Target number of nodes per partition
    pub size: u32,
    /// Multiplier applied to `size` for the terms aggregation
    pub factor: f64,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            size: NODE_REQUEST_PARTITION_SIZE,
            factor: NODE_REQUEST_PARTITION_FACTOR,
        }
    }
}

impl PartitionConfig {
    pub fn new(size: u32, factor: f64) -> Self {
        Self { size, factor }
    }

    /// The `size` of the partitioned terms aggregation
    pub fn terms_size(&self) -> u64 {
        (self.size as f64 * self.factor).round() as u64
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(ValidationError::InvalidPartitionConfig(
                "partition size must be greater than 0".to_string(),
            )
            .into());
        }

        if !self.factor.is_finite() || self.factor < 1.0 {
            return Err(ValidationError::InvalidPartitionConfig(format!(
                "partition factor must be a finite number >= 1.0, got {}",
                self.factor
            ))
            .into());
        }

        Ok(())
    }
}
