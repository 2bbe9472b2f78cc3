//! Inserts the `timeseries` date histogram at the innermost grouping level.

use super::{ProcessorContext, QueryDocument};
use crate::bucket::{Interval, format_offset};
use crate::dsl::{DateHistogramAggregation, ExtendedBounds};
use crate::error::Result;
use crate::request::QueryRequestOptions;
use tracing::debug;

pub fn process(context: &ProcessorContext<'_>, mut document: QueryDocument) -> Result<QueryDocument> {
    document.timeseries = Some(build_date_histogram(context.options, &context.interval));
    Ok(document)
}

/// Buckets are aligned to the end of the time range rather than to the
/// epoch, so the last bucket holds the trailing window of the range
pub fn build_date_histogram(
    options: &QueryRequestOptions,
    interval: &Interval,
) -> DateHistogramAggregation {
    let timerange = &options.timerange;
    let offset = interval.offset_for(timerange.to);

    debug!(
        interval_ms = interval.millis,
        offset_ms = offset,
        "aligned date histogram to end of range"
    );

    DateHistogramAggregation {
        field: options.source_configuration.timestamp.clone(),
        interval: interval.expression.clone(),
        offset: format_offset(offset),
        min_doc_count: 0,
        extended_bounds: Some(ExtendedBounds {
            min: timerange.from,
            max: timerange.to,
        }),
    }
}
