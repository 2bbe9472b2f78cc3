//! Partitioned terms aggregation over the node identifier field.

use super::{NodesAggregation, ProcessorContext, QueryDocument};
use crate::config::PartitionConfig;
use crate::dsl::{SortOrder, TermsAggregation, TermsPartition, TopHitsAggregation};
use crate::error::Result;
use crate::request::{NodeType, QueryRequestOptions, SourceFields};

/// Field that identifies a node of the given type
pub fn node_field(node_type: NodeType, fields: &SourceFields) -> &str {
    match node_type {
        NodeType::Host => &fields.host,
        NodeType::Pod => &fields.pod,
        NodeType::Container => &fields.container,
    }
}

/// Field that holds the human readable name of a node
pub fn name_field(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::Host => "host.name",
        NodeType::Pod => "kubernetes.pod.name",
        NodeType::Container => "docker.container.name",
    }
}

pub fn process(context: &ProcessorContext<'_>, mut document: QueryDocument) -> Result<QueryDocument> {
    document.nodes = Some(build_nodes_aggregation(context.options, context.partition));
    Ok(document)
}

pub fn build_nodes_aggregation(
    options: &QueryRequestOptions,
    partition: &PartitionConfig,
) -> NodesAggregation {
    let fields = &options.source_configuration;

    // Terms are ordered by key so that partitions page deterministically
    let terms = TermsAggregation {
        field: node_field(options.node_type, fields).to_string(),
        size: Some(partition.terms_size()),
        include: Some(TermsPartition {
            partition: options.partition_id,
            num_partitions: options.number_of_partitions,
        }),
        order: Some(("_key".to_string(), SortOrder::Asc)),
    };

    // Latest document of each node, reduced to its name
    let details = TopHitsAggregation {
        size: 1,
        sort: vec![(fields.timestamp.clone(), SortOrder::Desc)],
        source_includes: vec![name_field(options.node_type).to_string()],
    };

    NodesAggregation { terms, details }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Timerange;

    fn options(node_type: NodeType) -> QueryRequestOptions {
        QueryRequestOptions::new(node_type, Timerange::new(0, 60_000, "1m"))
    }

    #[test]
    fn test_node_fields() {
        let fields = SourceFields::default();
        assert_eq!(node_field(NodeType::Host, &fields), "host.name");
        assert_eq!(node_field(NodeType::Pod, &fields), "kubernetes.pod.uid");
        assert_eq!(node_field(NodeType::Container, &fields), "docker.container.id");
    }

    #[test]
    fn test_partition_settings() {
        let nodes = build_nodes_aggregation(
            &options(NodeType::Pod).with_partition(3, 7),
            &PartitionConfig::default(),
        );

        assert_eq!(nodes.terms.field, "kubernetes.pod.uid");
        assert_eq!(nodes.terms.size, Some(90));
        assert_eq!(
            nodes.terms.include,
            Some(TermsPartition {
                partition: 3,
                num_partitions: 7
            })
        );
        assert_eq!(nodes.terms.order, Some(("_key".to_string(), SortOrder::Asc)));
    }

    #[test]
    fn test_size_ignores_partition_values() {
        let partition = PartitionConfig::new(20, 1.5);
        for (id, count) in [(0, 1), (4, 5), (99, 100)] {
            let nodes =
                build_nodes_aggregation(&options(NodeType::Host).with_partition(id, count), &partition);
            assert_eq!(nodes.terms.size, Some(30));
        }
    }

    #[test]
    fn test_details_fetch_latest_name() {
        let nodes = build_nodes_aggregation(&options(NodeType::Container), &PartitionConfig::default());

        assert_eq!(nodes.details.size, 1);
        assert_eq!(
            nodes.details.sort,
            vec![("@timestamp".to_string(), SortOrder::Desc)]
        );
        assert_eq!(nodes.details.source_includes, vec!["docker.container.name"]);
    }
}
