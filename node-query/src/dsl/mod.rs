//! Typed subset of the Elasticsearch Query DSL.
//!
//! Node queries are assembled as values of these types and only turned into
//! JSON by [`SearchBody::to_value`] once the pipeline is done.

mod aggregation;
mod query;

pub use aggregation::{
    Aggregation, AggregationNode, Aggregations, BucketScriptAggregation,
    DateHistogramAggregation, DerivativeAggregation, ExtendedBounds, FiltersAggregation,
    GapPolicy, Script, SortOrder, TermsAggregation, TermsPartition, TopHitsAggregation,
    aggregations_to_value,
};
pub use query::{BoolQuery, Query, QueryStringQuery, RangeQuery};

use serde::{Serialize, Serializer};
use serde_json::{Value, json};

/// Body of a `_search` request. Hits are never requested, only aggregations.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchBody {
    pub size: u32,
    pub query: Query,
    pub aggs: Aggregations,
}

impl SearchBody {
    pub fn to_value(&self) -> Value {
        json!({
            "size": self.size,
            "query": self.query.to_value(),
            "aggs": aggregations_to_value(&self.aggs),
        })
    }
}

impl Serialize for SearchBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}
