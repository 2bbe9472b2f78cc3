//! One nested aggregation level per grouping, beneath the node terms.

use super::{ProcessorContext, QueryDocument};
use crate::dsl::{Aggregation, FiltersAggregation, Query, TermsAggregation};
use crate::error::Result;
use crate::request::GroupBy;

/// Query used for sub-filters that have no query of their own
const MATCH_ALL_QUERY: &str = "*";

/// Aggregation key of the grouping level at `index`
pub fn group_key(index: usize) -> String {
    format!("path_{index}")
}

pub fn process(context: &ProcessorContext<'_>, mut document: QueryDocument) -> Result<QueryDocument> {
    // Levels are replaced, composing twice never stacks levels
    document.group_by = context.options.group_by.iter().map(group_aggregation).collect();
    Ok(document)
}

pub fn group_aggregation(group: &GroupBy) -> Aggregation {
    match group {
        GroupBy::Terms { field, .. } => Aggregation::Terms(TermsAggregation::new(field.clone())),
        GroupBy::Filters { filters, .. } => Aggregation::Filters(FiltersAggregation {
            filters: filters
                .iter()
                .map(|filter| {
                    let query = filter
                        .query
                        .as_deref()
                        .map(str::trim)
                        .filter(|query| !query.is_empty())
                        .unwrap_or(MATCH_ALL_QUERY);
                    Query::query_string(query)
                })
                .collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::AggregationNode;
    use crate::request::PathFilter;
    use serde_json::json;

    #[test]
    fn test_group_keys() {
        assert_eq!(group_key(0), "path_0");
        assert_eq!(group_key(1), "path_1");
    }

    #[test]
    fn test_terms_level() {
        let node = AggregationNode::new(group_aggregation(&GroupBy::terms("cloud.region")));
        assert_eq!(node.to_value(), json!({ "terms": { "field": "cloud.region" } }));
    }

    #[test]
    fn test_filters_level_defaults_to_match_all() {
        let group = GroupBy::filters(vec![
            PathFilter::new("nginx", Some("service.type:nginx")),
            PathFilter::new("missing", None),
            PathFilter::new("blank", Some("  ")),
        ]);

        let node = AggregationNode::new(group_aggregation(&group));
        assert_eq!(
            node.to_value(),
            json!({
                "filters": {
                    "filters": [
                        { "query_string": { "query": "service.type:nginx", "analyze_wildcard": true } },
                        { "query_string": { "query": "*", "analyze_wildcard": true } },
                        { "query_string": { "query": "*", "analyze_wildcard": true } }
                    ]
                }
            })
        );
    }
}
