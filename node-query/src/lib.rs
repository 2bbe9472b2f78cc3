//! Infrastructure node metrics query builder.
//!
//! This crate composes the single nested Elasticsearch search body used to
//! fetch partitioned, grouped, time-bucketed metrics for hosts, pods and
//! containers. Building a query is a pure function of the request options
//! and the partition configuration. Nothing here performs I/O.

pub mod bucket;
pub mod config;
pub mod dsl;
pub mod error;
pub mod partition;
pub mod processors;
pub mod request;

pub use bucket::{
    Interval, MAX_EPOCH_MILLIS, MIN_EPOCH_MILLIS, calculate_offset, format_offset, get_bucket_key,
    parse_interval,
};
pub use config::{NODE_REQUEST_PARTITION_FACTOR, NODE_REQUEST_PARTITION_SIZE, PartitionConfig};
pub use dsl::SearchBody;
pub use error::{QueryError, Result, ValidationError};
pub use partition::{build_cardinality_query, partition_count, partitioned_options};
pub use processors::path::{MAX_PATH_DEPTH, ResolvedPath, resolve_path};
pub use processors::{QueryDocument, build_node_query, build_node_query_from_request};
pub use request::{
    GroupBy, MetricType, NodeRequest, NodeType, PathElement, PathFilter, PathType,
    QueryRequestOptions, SourceFields, Timerange,
};
