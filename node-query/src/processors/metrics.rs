//! Metric aggregations computed inside every time bucket.

use super::{ProcessorContext, QueryDocument};
use crate::dsl::{
    Aggregation, AggregationNode, Aggregations, BucketScriptAggregation,
    DerivativeAggregation, GapPolicy, Script,
};
use crate::error::{Result, ValidationError};
use crate::request::{MetricType, NodeType};
use indexmap::IndexMap;

pub fn process(context: &ProcessorContext<'_>, mut document: QueryDocument) -> Result<QueryDocument> {
    let options = context.options;
    document.metrics = metric_aggregations(options.node_type, options.metric)?;
    Ok(document)
}

/// Aggregations that produce `metric` for nodes of `node_type`. The final
/// value is always exposed under the metric's own name.
pub fn metric_aggregations(node_type: NodeType, metric: MetricType) -> Result<Aggregations> {
    let name = metric.as_str();

    let aggs = match (metric, node_type) {
        (MetricType::Count, _) => count(),
        (MetricType::Cpu, NodeType::Host) => host_cpu(),
        (MetricType::Cpu, NodeType::Pod) => average(name, "kubernetes.pod.cpu.usage.node.pct"),
        (MetricType::Cpu, NodeType::Container) => average(name, "docker.cpu.total.pct"),
        (MetricType::Memory, NodeType::Host) => average(name, "system.memory.actual.used.pct"),
        (MetricType::Memory, NodeType::Pod) => {
            average(name, "kubernetes.pod.memory.usage.node.pct")
        }
        (MetricType::Memory, NodeType::Container) => average(name, "docker.memory.usage.pct"),
        (MetricType::Load, NodeType::Host) => average(name, "system.load.5"),
        (MetricType::Rx, NodeType::Host) => rate(name, "system.network.in.bytes"),
        (MetricType::Rx, NodeType::Pod) => rate(name, "kubernetes.pod.network.rx.bytes"),
        (MetricType::Rx, NodeType::Container) => rate(name, "docker.network.in.bytes"),
        (MetricType::Tx, NodeType::Host) => rate(name, "system.network.out.bytes"),
        (MetricType::Tx, NodeType::Pod) => rate(name, "kubernetes.pod.network.tx.bytes"),
        (MetricType::Tx, NodeType::Container) => rate(name, "docker.network.out.bytes"),
        (MetricType::Load, NodeType::Pod | NodeType::Container) => {
            return Err(ValidationError::UnsupportedMetric { metric, node_type }.into());
        }
    };

    Ok(aggs)
}

fn named(entries: Vec<(&str, Aggregation)>) -> Aggregations {
    entries
        .into_iter()
        .map(|(name, aggregation)| (name.to_string(), AggregationNode::new(aggregation)))
        .collect()
}

fn buckets_path(entries: &[(&str, &str)]) -> IndexMap<String, String> {
    entries
        .iter()
        .map(|(variable, path)| (variable.to_string(), path.to_string()))
        .collect()
}

fn average(name: &str, field: &str) -> Aggregations {
    named(vec![(name, Aggregation::avg(field))])
}

fn count() -> Aggregations {
    named(vec![(
        MetricType::Count.as_str(),
        Aggregation::BucketScript(BucketScriptAggregation {
            buckets_path: buckets_path(&[("count", "_count")]),
            script: Script::expression("count * 1"),
            gap_policy: GapPolicy::Skip,
        }),
    )])
}

// Buckets missing any of the inputs, including hosts that did not report
// their core count, get no cpu value at all.
fn host_cpu() -> Aggregations {
    named(vec![
        ("cpu_user", Aggregation::avg("system.cpu.user.pct")),
        ("cpu_system", Aggregation::avg("system.cpu.system.pct")),
        ("cpu_cores", Aggregation::max("system.cpu.cores")),
        (
            MetricType::Cpu.as_str(),
            Aggregation::BucketScript(BucketScriptAggregation {
                buckets_path: buckets_path(&[
                    ("user", "cpu_user"),
                    ("system", "cpu_system"),
                    ("cores", "cpu_cores"),
                ]),
                script: Script::painless("(params.user + params.system) / params.cores"),
                gap_policy: GapPolicy::Skip,
            }),
        ),
    ])
}

/// Per-second rate of a monotonic byte counter. Counter resets show up as
/// negative derivatives and are clamped to zero.
fn rate(name: &str, field: &str) -> Aggregations {
    let max_name = format!("{name}_max");
    let deriv_name = format!("{name}_deriv");

    named(vec![
        (max_name.as_str(), Aggregation::max(field)),
        (
            deriv_name.as_str(),
            Aggregation::Derivative(DerivativeAggregation {
                buckets_path: max_name.clone(),
                gap_policy: GapPolicy::Skip,
                unit: Some("1s".to_string()),
            }),
        ),
        (
            name,
            Aggregation::BucketScript(BucketScriptAggregation {
                buckets_path: buckets_path(&[("value", deriv_name.as_str())]),
                script: Script::painless("params.value > 0.0 ? params.value : 0.0"),
                gap_policy: GapPolicy::Skip,
            }),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::aggregations_to_value;
    use crate::error::QueryError;
    use serde_json::json;

    fn names(aggs: &Aggregations) -> Vec<&str> {
        aggs.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_host_cpu_is_derived() {
        let aggs = metric_aggregations(NodeType::Host, MetricType::Cpu).unwrap();
        assert_eq!(names(&aggs), ["cpu_user", "cpu_system", "cpu_cores", "cpu"]);

        let bucket_scripts = aggs
            .values()
            .filter(|node| matches!(node.aggregation, Aggregation::BucketScript(_)))
            .count();
        assert_eq!(bucket_scripts, 1);

        assert_eq!(
            aggregations_to_value(&aggs)["cpu"],
            json!({
                "bucket_script": {
                    "buckets_path": { "user": "cpu_user", "system": "cpu_system", "cores": "cpu_cores" },
                    "script": {
                        "source": "(params.user + params.system) / params.cores",
                        "lang": "painless"
                    },
                    "gap_policy": "skip"
                }
            })
        );
    }

    #[test]
    fn test_pod_and_container_cpu_are_direct_averages() {
        let pod = metric_aggregations(NodeType::Pod, MetricType::Cpu).unwrap();
        assert_eq!(
            aggregations_to_value(&pod),
            json!({ "cpu": { "avg": { "field": "kubernetes.pod.cpu.usage.node.pct" } } })
        );

        let container = metric_aggregations(NodeType::Container, MetricType::Cpu).unwrap();
        assert_eq!(
            aggregations_to_value(&container),
            json!({ "cpu": { "avg": { "field": "docker.cpu.total.pct" } } })
        );
    }

    #[test]
    fn test_rate_metrics() {
        let aggs = metric_aggregations(NodeType::Container, MetricType::Tx).unwrap();
        assert_eq!(names(&aggs), ["tx_max", "tx_deriv", "tx"]);

        let value = aggregations_to_value(&aggs);
        assert_eq!(value["tx_max"], json!({ "max": { "field": "docker.network.out.bytes" } }));
        assert_eq!(
            value["tx_deriv"],
            json!({ "derivative": { "buckets_path": "tx_max", "gap_policy": "skip", "unit": "1s" } })
        );
        assert_eq!(value["tx"]["bucket_script"]["buckets_path"], json!({ "value": "tx_deriv" }));
    }

    #[test]
    fn test_count_uses_doc_count() {
        let aggs = metric_aggregations(NodeType::Pod, MetricType::Count).unwrap();
        let value = aggregations_to_value(&aggs);
        assert_eq!(value["count"]["bucket_script"]["buckets_path"], json!({ "count": "_count" }));
    }

    #[test]
    fn test_load_is_host_only() {
        assert!(metric_aggregations(NodeType::Host, MetricType::Load).is_ok());
        assert_eq!(
            metric_aggregations(NodeType::Pod, MetricType::Load),
            Err(QueryError::Validation(ValidationError::UnsupportedMetric {
                metric: MetricType::Load,
                node_type: NodeType::Pod,
            }))
        );
    }
}
