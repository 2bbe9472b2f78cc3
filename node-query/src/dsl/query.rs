use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

/// Query clauses used by node queries
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Bool(BoolQuery),
    Range(RangeQuery),
    Exists { field: String },
    QueryString(QueryStringQuery),
    MatchAll,
    /// A clause that was already compiled to Query DSL by the caller
    Raw(Value),
}

impl Query {
    pub fn exists(field: impl Into<String>) -> Self {
        Query::Exists {
            field: field.into(),
        }
    }

    pub fn query_string(query: impl Into<String>) -> Self {
        Query::QueryString(QueryStringQuery {
            query: query.into(),
            analyze_wildcard: true,
        })
    }

    pub fn to_value(&self) -> Value {
        match self {
            Query::Bool(bool_query) => json!({ "bool": bool_query.to_value() }),
            Query::Range(range) => range.to_value(),
            Query::Exists { field } => json!({ "exists": { "field": field } }),
            Query::QueryString(query_string) => json!({
                "query_string": {
                    "query": query_string.query,
                    "analyze_wildcard": query_string.analyze_wildcard,
                }
            }),
            Query::MatchAll => json!({ "match_all": {} }),
            Query::Raw(value) => value.clone(),
        }
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Boolean combination of clauses. Empty clause lists are left out of the
/// wire format.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub filter: Vec<Query>,
    pub must: Vec<Query>,
    pub should: Vec<Query>,
}

impl BoolQuery {
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();

        for (occur, clauses) in [
            ("filter", &self.filter),
            ("must", &self.must),
            ("should", &self.should),
        ] {
            if !clauses.is_empty() {
                let clauses = clauses.iter().map(Query::to_value).collect();
                map.insert(occur.to_string(), Value::Array(clauses));
            }
        }

        Value::Object(map)
    }
}

/// Inclusive range over an epoch-millis field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    pub field: String,
    pub gte: i64,
    pub lte: i64,
}

impl RangeQuery {
    pub fn epoch_millis(field: impl Into<String>, gte: i64, lte: i64) -> Self {
        Self {
            field: field.into(),
            gte,
            lte,
        }
    }

    pub fn to_value(&self) -> Value {
        let mut bounds = Map::new();
        bounds.insert(
            self.field.clone(),
            json!({
                "gte": self.gte,
                "lte": self.lte,
                "format": "epoch_millis",
            }),
        );

        json!({ "range": bounds })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryStringQuery {
    pub query: String,
    pub analyze_wildcard: bool,
}
