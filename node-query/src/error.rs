//! Error types for node query construction

use crate::request::{MetricType, NodeType, PathType};
use thiserror::Error;

/// Malformed request input. These are caller mistakes and are never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Path must not be empty")]
    EmptyPath,

    #[error("Path has {depth} levels, at most {max} are allowed")]
    PathTooDeep { depth: usize, max: usize },

    #[error("Path contains {count} node type groupings, at most one is allowed")]
    TooManyNodeTypes { count: usize },

    #[error("Path must end with hosts, pods or containers, found {found}")]
    InvalidTerminal { found: PathType },

    #[error("Group by has {depth} levels, at most {max} are allowed")]
    GroupByTooDeep { depth: usize, max: usize },

    #[error("Invalid interval: {interval:?}")]
    InvalidInterval { interval: String },

    #[error("Invalid time range: from {from} to {to}")]
    InvalidTimerange { from: i64, to: i64 },

    #[error("Invalid partition {partition_id} of {number_of_partitions}")]
    InvalidPartition {
        partition_id: u32,
        number_of_partitions: u32,
    },

    #[error("Metric {metric} is not available for {node_type} nodes")]
    UnsupportedMetric {
        metric: MetricType,
        node_type: NodeType,
    },

    #[error("Invalid partition configuration: {0}")]
    InvalidPartitionConfig(String),
}

/// Errors that can occur while building a node query
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Request failed validation
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// Caller and pipeline disagree on the set of known types
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QueryError {
    /// Whether the error was caused by the request (HTTP 400 territory)
    pub fn is_validation(&self) -> bool {
        matches!(self, QueryError::Validation(_))
    }
}

/// A specialized Result type for query construction
pub type Result<T> = std::result::Result<T, QueryError>;
