//! The node query pipeline.
//!
//! Every processor takes the [`QueryDocument`] by value, fills in its own
//! part and hands it on. The document only becomes a nested aggregation tree
//! in [`QueryDocument::into_search_body`], after all processors ran.

pub mod base_query;
pub mod date_histogram;
pub mod group_by;
pub mod metrics;
pub mod nodes;
pub mod path;

use crate::bucket::Interval;
use crate::config::PartitionConfig;
use crate::dsl::{
    Aggregation, AggregationNode, Aggregations, BoolQuery, DateHistogramAggregation, Query,
    SearchBody, TermsAggregation, TopHitsAggregation,
};
use crate::error::{QueryError, Result};
use crate::request::{NodeRequest, QueryRequestOptions};
use tracing::{debug, instrument};

pub const WAFFLE_AGG: &str = "waffle";
pub const NODES_AGG: &str = "nodes";
pub const NODE_DETAILS_AGG: &str = "nodeDetails";
pub const TIMESERIES_AGG: &str = "timeseries";

/// The partitioned node terms aggregation and its name lookup
#[derive(Debug, Clone, PartialEq)]
pub struct NodesAggregation {
    pub terms: TermsAggregation,
    pub details: TopHitsAggregation,
}

/// Query under construction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDocument {
    pub query: BoolQuery,
    pub nodes: Option<NodesAggregation>,
    /// Grouping levels, outermost first
    pub group_by: Vec<Aggregation>,
    pub timeseries: Option<DateHistogramAggregation>,
    /// Metrics computed inside every time bucket
    pub metrics: Aggregations,
}

impl QueryDocument {
    /// Nest the collected parts into `waffle > nodes > path_0.. > timeseries`
    pub fn into_search_body(self) -> Result<SearchBody> {
        let nodes = self.nodes.ok_or_else(|| {
            QueryError::Internal("node terms aggregation has not been built".to_string())
        })?;

        let mut innermost = Aggregations::new();
        match self.timeseries {
            Some(histogram) => {
                innermost.insert(
                    TIMESERIES_AGG.to_string(),
                    AggregationNode::with_aggs(Aggregation::DateHistogram(histogram), self.metrics),
                );
            }
            None if !self.metrics.is_empty() => {
                return Err(QueryError::Internal(
                    "metrics require a date histogram".to_string(),
                ));
            }
            None => {}
        }

        for (index, aggregation) in self.group_by.into_iter().enumerate().rev() {
            let level = AggregationNode::with_aggs(aggregation, std::mem::take(&mut innermost));
            innermost.insert(group_by::group_key(index), level);
        }

        let mut node_aggs = Aggregations::new();
        node_aggs.insert(
            NODE_DETAILS_AGG.to_string(),
            Aggregation::TopHits(nodes.details).into(),
        );
        node_aggs.extend(innermost);

        let mut waffle_aggs = Aggregations::new();
        waffle_aggs.insert(
            NODES_AGG.to_string(),
            AggregationNode::with_aggs(Aggregation::Terms(nodes.terms), node_aggs),
        );

        let mut aggs = Aggregations::new();
        aggs.insert(
            WAFFLE_AGG.to_string(),
            AggregationNode::with_aggs(Aggregation::Filter(Query::MatchAll), waffle_aggs),
        );

        Ok(SearchBody {
            size: 0,
            query: Query::Bool(self.query),
            aggs,
        })
    }
}

/// Inputs shared by all processors of one build
#[derive(Debug, Clone)]
pub struct ProcessorContext<'a> {
    pub options: &'a QueryRequestOptions,
    pub partition: &'a PartitionConfig,
    pub interval: Interval,
}

impl<'a> ProcessorContext<'a> {
    pub fn new(options: &'a QueryRequestOptions, partition: &'a PartitionConfig) -> Result<Self> {
        partition.validate()?;
        options.validate()?;

        Ok(Self {
            options,
            partition,
            interval: options.interval()?,
        })
    }
}

pub type Processor = fn(&ProcessorContext<'_>, QueryDocument) -> Result<QueryDocument>;

/// Processors in the order they are applied
pub const PIPELINE: &[(&str, Processor)] = &[
    ("base_query", base_query::process),
    ("nodes", nodes::process),
    ("group_by", group_by::process),
    ("date_histogram", date_histogram::process),
    ("metrics", metrics::process),
];

/// Build the search body for one partition of a node request
#[instrument(
    level = "debug",
    skip_all,
    fields(
        node_type = %options.node_type,
        metric = %options.metric,
        partition = options.partition_id,
        partitions = options.number_of_partitions,
    )
)]
pub fn build_node_query(
    options: &QueryRequestOptions,
    partition: &PartitionConfig,
) -> Result<SearchBody> {
    let context = ProcessorContext::new(options, partition).inspect_err(|e| {
        debug!(error = %e, "rejected node query options");
    })?;

    let mut document = QueryDocument::default();
    for (name, processor) in PIPELINE {
        document = processor(&context, document)?;
        debug!(processor = name, "applied processor");
    }

    debug!(depth = options.group_by.len(), "composed node query");
    document.into_search_body()
}

/// Resolve the request path, then build its search body
pub fn build_node_query_from_request(
    request: NodeRequest,
    partition: &PartitionConfig,
) -> Result<SearchBody> {
    let options = request.into_options()?;
    build_node_query(&options, partition)
}
