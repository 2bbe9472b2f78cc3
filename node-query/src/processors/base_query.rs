//! Boolean query shared by node and node count requests.

use super::{ProcessorContext, QueryDocument};
use crate::dsl::{BoolQuery, Query, RangeQuery};
use crate::error::Result;
use crate::request::{GroupBy, QueryRequestOptions};
use tracing::debug;

pub fn process(context: &ProcessorContext<'_>, mut document: QueryDocument) -> Result<QueryDocument> {
    document.query = build_bool_query(context.options);
    Ok(document)
}

/// Time range filter, grouping field guards and the free-text filter
pub fn build_bool_query(options: &QueryRequestOptions) -> BoolQuery {
    let fields = &options.source_configuration;
    let mut query = BoolQuery::default();

    query.filter.push(Query::Range(RangeQuery::epoch_millis(
        fields.timestamp.clone(),
        options.timerange.from,
        options.timerange.to,
    )));

    for group in &options.group_by {
        match group {
            GroupBy::Terms { field, .. } => {
                if !field.is_empty() {
                    query.must.push(Query::exists(field.clone()));
                }
            }
            GroupBy::Filters { filters, .. } => {
                query.should.extend(
                    filters
                        .iter()
                        .filter_map(|filter| filter.query.as_deref())
                        .map(str::trim)
                        .filter(|query| !query.is_empty())
                        .map(Query::query_string),
                );
            }
        }
    }

    if let Some(filter_query) = options.filter_query.as_deref() {
        if let Some(clause) = parse_filter_query(filter_query) {
            query.must.push(clause);
        }
    }

    query
}

/// The filter is either an already compiled Query DSL object or query
/// string syntax. Blank filters match everything and produce no clause.
fn parse_filter_query(filter_query: &str) -> Option<Query> {
    let trimmed = filter_query.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.starts_with('{') {
        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(value) if value.is_object() => return Some(Query::Raw(value)),
            _ => debug!("filter query is not valid JSON, using query string syntax"),
        }
    }

    Some(Query::query_string(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{NodeType, PathFilter, SourceFields, Timerange};
    use serde_json::json;

    fn options() -> QueryRequestOptions {
        QueryRequestOptions::new(NodeType::Host, Timerange::new(1_000, 2_000, "1m"))
    }

    #[test]
    fn test_range_filter_only() {
        let query = build_bool_query(&options());

        assert_eq!(
            Query::Bool(query).to_value(),
            json!({
                "bool": {
                    "filter": [
                        { "range": { "@timestamp": { "gte": 1000, "lte": 2000, "format": "epoch_millis" } } }
                    ]
                }
            })
        );
    }

    #[test]
    fn test_custom_timestamp_field() {
        let fields = SourceFields {
            timestamp: "event.created".to_string(),
            ..Default::default()
        };
        let query = build_bool_query(&options().with_source_configuration(fields));

        let value = Query::Bool(query).to_value();
        assert!(value.pointer("/bool/filter/0/range/event.created").is_some());
    }

    #[test]
    fn test_grouping_guards() {
        let options = options().with_group_by(vec![
            GroupBy::terms("cloud.region"),
            GroupBy::terms(""),
            GroupBy::filters(vec![
                PathFilter::new("web", Some("service.type:nginx")),
                PathFilter::new("other", None),
            ]),
        ]);

        let query = build_bool_query(&options);
        assert_eq!(query.must, vec![Query::exists("cloud.region")]);
        assert_eq!(query.should, vec![Query::query_string("service.type:nginx")]);
    }

    #[test]
    fn test_query_string_filter_is_required() {
        let query = build_bool_query(&options().with_filter_query("host.os.family:debian"));
        assert_eq!(query.must, vec![Query::query_string("host.os.family:debian")]);
    }

    #[test]
    fn test_json_filter_is_embedded() {
        let filter = r#"{"bool":{"should":[{"match":{"host.name":"web-1"}}]}}"#;
        let query = build_bool_query(&options().with_filter_query(filter));

        assert_eq!(
            query.must,
            vec![Query::Raw(json!({
                "bool": { "should": [{ "match": { "host.name": "web-1" } }] }
            }))]
        );
    }

    #[test]
    fn test_malformed_json_filter_falls_back_to_query_string() {
        let query = build_bool_query(&options().with_filter_query("{not json"));
        assert_eq!(query.must, vec![Query::query_string("{not json")]);
    }

    #[test]
    fn test_blank_filter_is_ignored() {
        let query = build_bool_query(&options().with_filter_query("   "));
        assert!(query.must.is_empty());
    }
}
