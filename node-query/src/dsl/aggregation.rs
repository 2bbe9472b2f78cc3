use super::query::Query;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

/// Named sub-aggregations, kept in insertion order
pub type Aggregations = IndexMap<String, AggregationNode>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// How pipeline aggregations treat buckets with missing inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapPolicy {
    Skip,
}

impl GapPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GapPolicy::Skip => "skip",
        }
    }
}

/// A terms aggregation that only computes one slice of the term space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermsPartition {
    pub partition: u32,
    pub num_partitions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermsAggregation {
    pub field: String,
    pub size: Option<u64>,
    pub include: Option<TermsPartition>,
    pub order: Option<(String, SortOrder)>,
}

impl TermsAggregation {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            size: None,
            include: None,
            order: None,
        }
    }

    fn to_value(&self) -> Value {
        let mut body = Map::new();
        body.insert("field".to_string(), json!(self.field));
        if let Some(size) = self.size {
            body.insert("size".to_string(), json!(size));
        }
        if let Some(include) = self.include {
            body.insert(
                "include".to_string(),
                json!({
                    "partition": include.partition,
                    "num_partitions": include.num_partitions,
                }),
            );
        }
        if let Some((key, order)) = &self.order {
            let mut order_map = Map::new();
            order_map.insert(key.clone(), json!(order.as_str()));
            body.insert("order".to_string(), Value::Object(order_map));
        }
        Value::Object(body)
    }
}

/// Anonymous filters, one bucket per filter in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct FiltersAggregation {
    pub filters: Vec<Query>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedBounds {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateHistogramAggregation {
    pub field: String,
    pub interval: String,
    pub offset: String,
    pub min_doc_count: u64,
    pub extended_bounds: Option<ExtendedBounds>,
}

impl DateHistogramAggregation {
    fn to_value(&self) -> Value {
        let mut body = Map::new();
        body.insert("field".to_string(), json!(self.field));
        body.insert("interval".to_string(), json!(self.interval));
        body.insert("offset".to_string(), json!(self.offset));
        body.insert("min_doc_count".to_string(), json!(self.min_doc_count));
        if let Some(bounds) = self.extended_bounds {
            body.insert(
                "extended_bounds".to_string(),
                json!({ "min": bounds.min, "max": bounds.max }),
            );
        }
        Value::Object(body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopHitsAggregation {
    pub size: u32,
    pub sort: Vec<(String, SortOrder)>,
    pub source_includes: Vec<String>,
}

impl TopHitsAggregation {
    fn to_value(&self) -> Value {
        let sort: Vec<Value> = self
            .sort
            .iter()
            .map(|(field, order)| {
                let mut clause = Map::new();
                clause.insert(field.clone(), json!({ "order": order.as_str() }));
                Value::Object(clause)
            })
            .collect();

        json!({
            "size": self.size,
            "sort": sort,
            "_source": { "includes": self.source_includes },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivativeAggregation {
    pub buckets_path: String,
    pub gap_policy: GapPolicy,
    pub unit: Option<String>,
}

impl DerivativeAggregation {
    fn to_value(&self) -> Value {
        let mut body = Map::new();
        body.insert("buckets_path".to_string(), json!(self.buckets_path));
        body.insert("gap_policy".to_string(), json!(self.gap_policy.as_str()));
        if let Some(unit) = &self.unit {
            body.insert("unit".to_string(), json!(unit));
        }
        Value::Object(body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub source: String,
    pub lang: String,
}

impl Script {
    pub fn painless(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            lang: String::from("painless"),
        }
    }

    pub fn expression(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            lang: String::from("expression"),
        }
    }
}

/// Per-bucket computation over sibling metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketScriptAggregation {
    /// Script variable name to sibling aggregation path
    pub buckets_path: IndexMap<String, String>,
    pub script: Script,
    pub gap_policy: GapPolicy,
}

impl BucketScriptAggregation {
    fn to_value(&self) -> Value {
        let buckets_path: Map<String, Value> = self
            .buckets_path
            .iter()
            .map(|(name, path)| (name.clone(), json!(path)))
            .collect();

        json!({
            "buckets_path": buckets_path,
            "script": { "source": self.script.source, "lang": self.script.lang },
            "gap_policy": self.gap_policy.as_str(),
        })
    }
}

/// Aggregation kinds used by node queries
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    Filter(Query),
    Terms(TermsAggregation),
    Filters(FiltersAggregation),
    DateHistogram(DateHistogramAggregation),
    TopHits(TopHitsAggregation),
    Avg { field: String },
    Max { field: String },
    Cardinality { field: String },
    Derivative(DerivativeAggregation),
    BucketScript(BucketScriptAggregation),
}

impl Aggregation {
    pub fn avg(field: impl Into<String>) -> Self {
        Aggregation::Avg {
            field: field.into(),
        }
    }

    pub fn max(field: impl Into<String>) -> Self {
        Aggregation::Max {
            field: field.into(),
        }
    }

    /// Wire name of the aggregation type
    pub fn kind(&self) -> &'static str {
        match self {
            Aggregation::Filter(_) => "filter",
            Aggregation::Terms(_) => "terms",
            Aggregation::Filters(_) => "filters",
            Aggregation::DateHistogram(_) => "date_histogram",
            Aggregation::TopHits(_) => "top_hits",
            Aggregation::Avg { .. } => "avg",
            Aggregation::Max { .. } => "max",
            Aggregation::Cardinality { .. } => "cardinality",
            Aggregation::Derivative(_) => "derivative",
            Aggregation::BucketScript(_) => "bucket_script",
        }
    }

    fn body(&self) -> Value {
        match self {
            Aggregation::Filter(query) => query.to_value(),
            Aggregation::Terms(terms) => terms.to_value(),
            Aggregation::Filters(filters) => {
                let filters: Vec<Value> = filters.filters.iter().map(Query::to_value).collect();
                json!({ "filters": filters })
            }
            Aggregation::DateHistogram(histogram) => histogram.to_value(),
            Aggregation::TopHits(top_hits) => top_hits.to_value(),
            Aggregation::Avg { field }
            | Aggregation::Max { field }
            | Aggregation::Cardinality { field } => json!({ "field": field }),
            Aggregation::Derivative(derivative) => derivative.to_value(),
            Aggregation::BucketScript(script) => script.to_value(),
        }
    }
}

/// An aggregation together with its named sub-aggregations
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationNode {
    pub aggregation: Aggregation,
    pub aggs: Aggregations,
}

impl AggregationNode {
    pub fn new(aggregation: Aggregation) -> Self {
        Self {
            aggregation,
            aggs: Aggregations::new(),
        }
    }

    pub fn with_aggs(aggregation: Aggregation, aggs: Aggregations) -> Self {
        Self { aggregation, aggs }
    }

    pub fn to_value(&self) -> Value {
        let mut node = Map::new();
        node.insert(
            self.aggregation.kind().to_string(),
            self.aggregation.body(),
        );
        if !self.aggs.is_empty() {
            node.insert("aggs".to_string(), aggregations_to_value(&self.aggs));
        }
        Value::Object(node)
    }
}

impl From<Aggregation> for AggregationNode {
    fn from(aggregation: Aggregation) -> Self {
        AggregationNode::new(aggregation)
    }
}

impl Serialize for AggregationNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Serialize a set of named aggregations into an `aggs` object
pub fn aggregations_to_value(aggs: &Aggregations) -> Value {
    let map: Map<String, Value> = aggs
        .iter()
        .map(|(name, node)| (name.clone(), node.to_value()))
        .collect();
    Value::Object(map)
}
