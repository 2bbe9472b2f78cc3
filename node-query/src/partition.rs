//! Fan-out over large fleets.
//!
//! Callers first run the cardinality query to learn how many nodes match,
//! then issue one node query per partition.

use crate::config::PartitionConfig;
use crate::dsl::{Aggregation, AggregationNode, Aggregations, Query, SearchBody};
use crate::error::Result;
use crate::processors::base_query::build_bool_query;
use crate::processors::nodes::node_field;
use crate::request::QueryRequestOptions;
use tracing::{debug, instrument};

pub const NODE_COUNT_AGG: &str = "nodeCount";

/// Count the distinct nodes matched by the options' base query
#[instrument(level = "debug", skip_all, fields(node_type = %options.node_type))]
pub fn build_cardinality_query(options: &QueryRequestOptions) -> Result<SearchBody> {
    options.validate()?;

    let field = node_field(options.node_type, &options.source_configuration);

    let mut aggs = Aggregations::new();
    aggs.insert(
        NODE_COUNT_AGG.to_string(),
        AggregationNode::new(Aggregation::Cardinality {
            field: field.to_string(),
        }),
    );

    Ok(SearchBody {
        size: 0,
        query: Query::Bool(build_bool_query(options)),
        aggs,
    })
}

/// Number of partitions needed so that each holds at most `size` nodes
pub fn partition_count(cardinality: u64, partition: &PartitionConfig) -> u32 {
    let size = u64::from(partition.size.max(1));
    let count = cardinality.div_ceil(size).max(1);
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// One copy of `options` per partition
pub fn partitioned_options(
    options: &QueryRequestOptions,
    number_of_partitions: u32,
) -> Vec<QueryRequestOptions> {
    let number_of_partitions = number_of_partitions.max(1);
    debug!(number_of_partitions, "splitting node request");

    (0..number_of_partitions)
        .map(|partition_id| {
            options
                .clone()
                .with_partition(partition_id, number_of_partitions)
        })
        .collect()
}
