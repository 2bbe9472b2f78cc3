//! Request model for node queries.
//!
//! A [`NodeRequest`] is what a route handler parses out of an incoming
//! request. Resolving its path produces the immutable
//! [`QueryRequestOptions`] the pipeline consumes.

use crate::bucket::{Interval, MAX_EPOCH_MILLIS, MIN_EPOCH_MILLIS, parse_interval};
use crate::error::{Result, ValidationError};
use crate::processors::path::{MAX_PATH_DEPTH, resolve_path};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The terminal unit of infrastructure being measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Host,
    Pod,
    Container,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Host => "host",
            NodeType::Pod => "pod",
            NodeType::Container => "container",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminant of a [`PathElement`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PathType {
    Terms,
    Filters,
    Hosts,
    Pods,
    Containers,
}

impl PathType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathType::Terms => "terms",
            PathType::Filters => "filters",
            PathType::Hosts => "hosts",
            PathType::Pods => "pods",
            PathType::Containers => "containers",
        }
    }

    /// Whether this path type selects a node type rather than a grouping
    pub fn is_node_type(&self) -> bool {
        matches!(self, PathType::Hosts | PathType::Pods | PathType::Containers)
    }
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labelled sub-filter of a filters grouping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PathFilter {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl PathFilter {
    pub fn new(label: impl Into<String>, query: Option<&str>) -> Self {
        Self {
            label: label.into(),
            query: query.map(String::from),
        }
    }
}

/// One element of a user supplied grouping path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PathElement {
    Terms {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Filters {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        filters: Vec<PathFilter>,
    },
    Hosts {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Pods {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Containers {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

impl PathElement {
    pub fn terms(field: impl Into<String>) -> Self {
        PathElement::Terms {
            field: field.into(),
            label: None,
        }
    }

    pub fn filters(filters: Vec<PathFilter>) -> Self {
        PathElement::Filters {
            label: None,
            filters,
        }
    }

    pub fn hosts() -> Self {
        PathElement::Hosts { label: None }
    }

    pub fn pods() -> Self {
        PathElement::Pods { label: None }
    }

    pub fn containers() -> Self {
        PathElement::Containers { label: None }
    }

    pub fn path_type(&self) -> PathType {
        match self {
            PathElement::Terms { .. } => PathType::Terms,
            PathElement::Filters { .. } => PathType::Filters,
            PathElement::Hosts { .. } => PathType::Hosts,
            PathElement::Pods { .. } => PathType::Pods,
            PathElement::Containers { .. } => PathType::Containers,
        }
    }
}

/// A non-terminal grouping level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GroupBy {
    Terms {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Filters {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        filters: Vec<PathFilter>,
    },
}

impl GroupBy {
    pub fn terms(field: impl Into<String>) -> Self {
        GroupBy::Terms {
            field: field.into(),
            label: None,
        }
    }

    pub fn filters(filters: Vec<PathFilter>) -> Self {
        GroupBy::Filters {
            label: None,
            filters,
        }
    }
}

/// Requested time range. Bounds are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Timerange {
    pub from: i64,
    pub to: i64,
    /// Elasticsearch interval expression, e.g. "10s" or "1m"
    pub interval: String,
}

impl Timerange {
    pub fn new(from: i64, to: i64, interval: impl Into<String>) -> Self {
        Self {
            from,
            to,
            interval: interval.into(),
        }
    }
}

/// Names of the fields that hold node identifiers and timestamps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct SourceFields {
    pub timestamp: String,
    pub host: String,
    pub pod: String,
    pub container: String,
    /// Sent along by clients as part of the source configuration. Node
    /// queries never sort hits on it.
    pub tiebreaker: String,
}

impl Default for SourceFields {
    fn default() -> Self {
        Self {
            timestamp: String::from("@timestamp"),
            host: String::from("host.name"),
            pod: String::from("kubernetes.pod.uid"),
            container: String::from("docker.container.id"),
            tiebreaker: String::from("_doc"),
        }
    }
}

/// Metric computed for every node and time bucket
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Count,
    #[default]
    Cpu,
    Memory,
    Load,
    Rx,
    Tx,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Count => "count",
            MetricType::Cpu => "cpu",
            MetricType::Memory => "memory",
            MetricType::Load => "load",
            MetricType::Rx => "rx",
            MetricType::Tx => "tx",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_number_of_partitions() -> u32 {
    1
}

/// Node query request as received from a route handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeRequest {
    /// Grouping path. The last element selects the node type.
    pub path: Vec<PathElement>,
    pub timerange: Timerange,
    /// Free-text filter, either query string syntax or a JSON Query DSL clause
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_query: Option<String>,
    #[serde(default)]
    pub metric: MetricType,
    #[serde(default)]
    pub partition_id: u32,
    #[serde(default = "default_number_of_partitions")]
    pub number_of_partitions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_configuration: Option<SourceFields>,
}

impl NodeRequest {
    /// Resolve the grouping path and produce the pipeline options
    pub fn into_options(self) -> Result<QueryRequestOptions> {
        let resolved = resolve_path(&self.path)?;

        Ok(QueryRequestOptions {
            node_type: resolved.node_type,
            group_by: resolved.group_by,
            timerange: self.timerange,
            filter_query: self.filter_query,
            metric: self.metric,
            partition_id: self.partition_id,
            number_of_partitions: self.number_of_partitions,
            source_configuration: self.source_configuration.unwrap_or_default(),
        })
    }
}

/// Immutable input of the query pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequestOptions {
    pub node_type: NodeType,
    pub group_by: Vec<GroupBy>,
    pub timerange: Timerange,
    pub filter_query: Option<String>,
    pub metric: MetricType,
    pub partition_id: u32,
    pub number_of_partitions: u32,
    pub source_configuration: SourceFields,
}

impl QueryRequestOptions {
    /// Options for a single, unpartitioned, ungrouped request
    pub fn new(node_type: NodeType, timerange: Timerange) -> Self {
        Self {
            node_type,
            group_by: Vec::new(),
            timerange,
            filter_query: None,
            metric: MetricType::default(),
            partition_id: 0,
            number_of_partitions: 1,
            source_configuration: SourceFields::default(),
        }
    }

    pub fn with_group_by(mut self, group_by: Vec<GroupBy>) -> Self {
        self.group_by = group_by;
        self
    }

    pub fn with_filter_query(mut self, filter_query: impl Into<String>) -> Self {
        self.filter_query = Some(filter_query.into());
        self
    }

    pub fn with_metric(mut self, metric: MetricType) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_partition(mut self, partition_id: u32, number_of_partitions: u32) -> Self {
        self.partition_id = partition_id;
        self.number_of_partitions = number_of_partitions;
        self
    }

    pub fn with_source_configuration(mut self, fields: SourceFields) -> Self {
        self.source_configuration = fields;
        self
    }

    /// The parsed bucket interval of the time range
    pub fn interval(&self) -> Result<Interval> {
        parse_interval(&self.timerange.interval)
    }

    /// Check the constraints every pipeline stage relies on
    pub fn validate(&self) -> Result<()> {
        let Timerange { from, to, .. } = self.timerange;
        if from > to || from < MIN_EPOCH_MILLIS || to > MAX_EPOCH_MILLIS {
            return Err(ValidationError::InvalidTimerange { from, to }.into());
        }

        if self.number_of_partitions == 0 || self.partition_id >= self.number_of_partitions {
            return Err(ValidationError::InvalidPartition {
                partition_id: self.partition_id,
                number_of_partitions: self.number_of_partitions,
            }
            .into());
        }

        // The terminal node type takes one level of the path
        let max = MAX_PATH_DEPTH - 1;
        if self.group_by.len() > max {
            return Err(ValidationError::GroupByTooDeep {
                depth: self.group_by.len(),
                max,
            }
            .into());
        }

        self.interval()?;
        Ok(())
    }
}
