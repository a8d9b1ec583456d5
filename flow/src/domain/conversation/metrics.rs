//! Usage and performance metrics.
//!
//! Per-call `metadata` carries token counters, cost and latency numbers in one
//! flat object. The grouping pipeline splits it into two namespaces and later
//! folds the values of every block in a group into one summary.
//!
//! Both steps are driven by the static field tables below. Each entry names a
//! field and the reducer used when several values meet:
//!
//! | Field                     | Namespace   | Reducer |
//! |---------------------------|-------------|---------|
//! | token counters, `cost`    | usage       | Sum     |
//! | `ttft`                    | performance | First   |
//! | `tps`                     | performance | Mean    |
//! | `duration`, `latency`     | performance | Sum     |

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;

// ============================================================================
// METRIC TYPES
// ============================================================================

/// Token and cost counters of one or more model calls.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelUsage {
    #[serde(default)]
    pub accepted_prediction_tokens: Option<f64>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub input_audio_tokens: Option<f64>,
    #[serde(default)]
    pub input_cache_miss_tokens: Option<f64>,
    #[serde(default)]
    pub input_cached_tokens: Option<f64>,
    #[serde(default)]
    pub input_citation_tokens: Option<f64>,
    #[serde(default)]
    pub input_image_tokens: Option<f64>,
    #[serde(default)]
    pub input_text_tokens: Option<f64>,
    #[serde(default)]
    pub input_write_cache_tokens: Option<f64>,
    #[serde(default)]
    pub output_audio_tokens: Option<f64>,
    #[serde(default)]
    pub output_image_tokens: Option<f64>,
    #[serde(default)]
    pub output_reasoning_tokens: Option<f64>,
    #[serde(default)]
    pub output_text_tokens: Option<f64>,
    #[serde(default)]
    pub rejected_prediction_tokens: Option<f64>,
    #[serde(default)]
    pub total_input_tokens: Option<f64>,
    #[serde(default)]
    pub total_output_tokens: Option<f64>,
    #[serde(default)]
    pub total_tokens: Option<f64>,
}

/// Speed and latency numbers of one or more model calls.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModelPerformance {
    /// Total generation time (ms)
    #[serde(default)]
    pub duration: Option<f64>,
    /// Request round-trip time (ms)
    #[serde(default)]
    pub latency: Option<f64>,
    /// Tokens per second
    #[serde(default)]
    pub tps: Option<f64>,
    /// Time to first token (ms)
    #[serde(default)]
    pub ttft: Option<f64>,
}

// ============================================================================
// FIELD TABLES
// ============================================================================

/// How values of one field combine across blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Add all defined values
    Sum,
    /// Keep the first defined value
    First,
    /// Arithmetic mean over the blocks that define the field
    Mean,
}

/// One numeric field of a metrics struct and its reduction rule.
pub struct MetricField<T> {
    /// Wire name of the field
    pub name: &'static str,
    pub reducer: Reducer,
    pub get: fn(&T) -> Option<f64>,
    pub set: fn(&mut T, f64),
}

macro_rules! metric_field {
    ($name:literal, $field:ident, $reducer:ident) => {
        MetricField {
            name: $name,
            reducer: Reducer::$reducer,
            get: |m| m.$field,
            set: |m, v| m.$field = Some(v),
        }
    };
}

/// Usage namespace: every counter is summed.
pub const USAGE_FIELDS: &[MetricField<ModelUsage>] = &[
    metric_field!("acceptedPredictionTokens", accepted_prediction_tokens, Sum),
    metric_field!("cost", cost, Sum),
    metric_field!("inputAudioTokens", input_audio_tokens, Sum),
    metric_field!("inputCacheMissTokens", input_cache_miss_tokens, Sum),
    metric_field!("inputCachedTokens", input_cached_tokens, Sum),
    metric_field!("inputCitationTokens", input_citation_tokens, Sum),
    metric_field!("inputImageTokens", input_image_tokens, Sum),
    metric_field!("inputTextTokens", input_text_tokens, Sum),
    metric_field!("inputWriteCacheTokens", input_write_cache_tokens, Sum),
    metric_field!("outputAudioTokens", output_audio_tokens, Sum),
    metric_field!("outputImageTokens", output_image_tokens, Sum),
    metric_field!("outputReasoningTokens", output_reasoning_tokens, Sum),
    metric_field!("outputTextTokens", output_text_tokens, Sum),
    metric_field!("rejectedPredictionTokens", rejected_prediction_tokens, Sum),
    metric_field!("totalInputTokens", total_input_tokens, Sum),
    metric_field!("totalOutputTokens", total_output_tokens, Sum),
    metric_field!("totalTokens", total_tokens, Sum),
];

/// Performance namespace.
///
/// Time to first token only means something for the first call of a chain,
/// so later values are ignored.
pub const PERFORMANCE_FIELDS: &[MetricField<ModelPerformance>] = &[
    metric_field!("duration", duration, Sum),
    metric_field!("latency", latency, Sum),
    metric_field!("tps", tps, Mean),
    metric_field!("ttft", ttft, First),
];

// ============================================================================
// FOLDING
// ============================================================================

/// Reduce `sources` field by field according to `fields`.
///
/// Returns `None` when no source defines any field of the table.
pub fn fold_metrics<'a, T>(
    fields: &[MetricField<T>],
    sources: impl IntoIterator<Item = &'a T>,
) -> Option<T>
where
    T: Default + 'a,
{
    let sources: Vec<&T> = sources.into_iter().collect();
    let mut folded = T::default();
    let mut any = false;

    for field in fields {
        let mut values = sources.iter().filter_map(|source| (field.get)(source));
        let reduced = match field.reducer {
            Reducer::Sum => values.reduce(|acc, v| acc + v),
            Reducer::First => values.next(),
            Reducer::Mean => {
                let (sum, count) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
                (count > 0).then(|| sum / count as f64)
            }
        };

        if let Some(value) = reduced {
            (field.set)(&mut folded, value);
            any = true;
        }
    }

    any.then_some(folded)
}

/// Read the fields of a table out of a raw metadata object.
///
/// Keys outside the table and values that are not numbers are ignored.
fn read_fields<T: Default>(fields: &[MetricField<T>], raw: &JsonValue) -> Option<T> {
    let mut parsed = T::default();
    let mut any = false;
    for field in fields {
        if let Some(value) = raw.get(field.name).and_then(JsonValue::as_f64) {
            (field.set)(&mut parsed, value);
            any = true;
        }
    }
    any.then_some(parsed)
}

impl ModelUsage {
    /// Sum usage across blocks.
    pub fn aggregate<'a>(items: impl IntoIterator<Item = &'a ModelUsage>) -> Option<Self> {
        fold_metrics(USAGE_FIELDS, items)
    }

    pub fn is_empty(&self) -> bool {
        USAGE_FIELDS.iter().all(|field| (field.get)(self).is_none())
    }
}

impl ModelPerformance {
    /// Combine performance across blocks (first ttft, mean tps, summed times).
    pub fn aggregate<'a>(items: impl IntoIterator<Item = &'a ModelPerformance>) -> Option<Self> {
        fold_metrics(PERFORMANCE_FIELDS, items)
    }

    pub fn is_empty(&self) -> bool {
        PERFORMANCE_FIELDS
            .iter()
            .all(|field| (field.get)(self).is_none())
    }
}

/// Split raw per-call metadata into its usage and performance parts.
///
/// Each part is `None` when metadata is missing or defines none of its fields.
/// Other keys (branch markers, provider extras) never reach a content block.
pub fn split_metadata(
    metadata: Option<&JsonValue>,
) -> (Option<ModelUsage>, Option<ModelPerformance>) {
    let Some(metadata) = metadata else {
        return (None, None);
    };
    (
        read_fields(USAGE_FIELDS, metadata),
        read_fields(PERFORMANCE_FIELDS, metadata),
    )
}

// ============================================================================
// SERIALIZATION
// ============================================================================

/// Largest integer an `f64` holds exactly (2^53 - 1)
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Metric value on the wire. Whole numbers are written as integers, so
/// summed token counts read `450` rather than `450.0`.
struct MetricValue(f64);

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0;
        if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
            serializer.serialize_i64(value as i64)
        } else {
            serializer.serialize_f64(value)
        }
    }
}

/// Write the defined fields of `source` in table order.
fn serialize_fields<T, S: Serializer>(
    fields: &[MetricField<T>],
    source: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(None)?;
    for field in fields {
        if let Some(value) = (field.get)(source) {
            map.serialize_entry(field.name, &MetricValue(value))?;
        }
    }
    map.end()
}

impl Serialize for ModelUsage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_fields(USAGE_FIELDS, self, serializer)
    }
}

impl Serialize for ModelPerformance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_fields(PERFORMANCE_FIELDS, self, serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_tables_match_wire_names() {
        let mut usage = ModelUsage::default();
        for (i, field) in USAGE_FIELDS.iter().enumerate() {
            (field.set)(&mut usage, i as f64 + 1.0);
        }
        let value = serde_json::to_value(&usage).unwrap();
        for (i, field) in USAGE_FIELDS.iter().enumerate() {
            assert_eq!(value[field.name], json!(i + 1), "field {}", field.name);
        }
        assert_eq!(value.as_object().unwrap().len(), USAGE_FIELDS.len());

        // and back
        let parsed: ModelUsage = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, usage);

        let mut performance = ModelPerformance::default();
        for field in PERFORMANCE_FIELDS {
            (field.set)(&mut performance, 7.0);
        }
        let value = serde_json::to_value(&performance).unwrap();
        for field in PERFORMANCE_FIELDS {
            assert_eq!(value[field.name], json!(7));
        }
    }

    #[test]
    fn test_whole_values_serialize_as_integers() {
        let usage = ModelUsage {
            total_tokens: Some(450.0),
            cost: Some(0.75),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&usage).unwrap(),
            r#"{"cost":0.75,"totalTokens":450}"#
        );

        let performance = ModelPerformance {
            tps: Some(55.5),
            ttft: Some(100.0),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&performance).unwrap(),
            r#"{"tps":55.5,"ttft":100}"#
        );

        assert_eq!(serde_json::to_string(&ModelUsage::default()).unwrap(), "{}");
    }

    #[test]
    fn test_split_metadata_partitions_fields() {
        let meta = json!({
            "totalInputTokens": 100,
            "totalOutputTokens": 50,
            "totalTokens": 150,
            "cost": 0.01,
            "tps": 50,
            "ttft": 100,
            "activeBranchIndex": 2
        });

        let (usage, performance) = split_metadata(Some(&meta));
        let usage = usage.unwrap();
        let performance = performance.unwrap();

        assert_eq!(usage.total_input_tokens, Some(100.0));
        assert_eq!(usage.total_output_tokens, Some(50.0));
        assert_eq!(usage.total_tokens, Some(150.0));
        assert_eq!(usage.cost, Some(0.01));
        assert_eq!(performance.tps, Some(50.0));
        assert_eq!(performance.ttft, Some(100.0));
        assert!(performance.duration.is_none());
        assert!(serde_json::to_value(&usage).unwrap().get("activeBranchIndex").is_none());
    }

    #[test]
    fn test_split_metadata_without_usage() {
        let meta = json!({"latency": 800});
        let (usage, performance) = split_metadata(Some(&meta));
        assert!(usage.is_none());
        assert_eq!(performance.unwrap().latency, Some(800.0));
    }

    #[test]
    fn test_split_metadata_missing() {
        assert_eq!(split_metadata(None), (None, None));
        assert_eq!(split_metadata(Some(&json!({"unrelated": true}))), (None, None));
    }

    #[test]
    fn test_split_metadata_ignores_non_numbers() {
        let meta = json!({"totalTokens": "12", "tps": null, "latency": 40});
        let (usage, performance) = split_metadata(Some(&meta));
        assert!(usage.is_none());
        let performance = performance.unwrap();
        assert!(performance.tps.is_none());
        assert_eq!(performance.latency, Some(40.0));

        assert_eq!(split_metadata(Some(&json!("not an object"))), (None, None));
        assert_eq!(split_metadata(Some(&JsonValue::Null)), (None, None));
    }

    #[test]
    fn test_aggregate_usage_sums_and_treats_missing_as_zero() {
        let a = ModelUsage {
            total_tokens: Some(150.0),
            cost: Some(0.01),
            ..Default::default()
        };
        let b = ModelUsage {
            total_tokens: Some(300.0),
            input_cached_tokens: Some(20.0),
            ..Default::default()
        };

        let total = ModelUsage::aggregate([&a, &b]).unwrap();
        assert_eq!(total.total_tokens, Some(450.0));
        assert_eq!(total.input_cached_tokens, Some(20.0));
        assert!((total.cost.unwrap() - 0.01).abs() < 1e-12);
        assert!(total.output_text_tokens.is_none());
    }

    #[test]
    fn test_aggregate_performance_rules() {
        let a = ModelPerformance {
            ttft: Some(100.0),
            tps: Some(50.0),
            duration: Some(1000.0),
            latency: Some(1200.0),
        };
        let b = ModelPerformance {
            ttft: Some(200.0),
            tps: Some(60.0),
            duration: Some(1500.0),
            latency: Some(1800.0),
        };

        let total = ModelPerformance::aggregate([&a, &b]).unwrap();
        assert_eq!(total.ttft, Some(100.0));
        assert_eq!(total.tps, Some(55.0));
        assert_eq!(total.duration, Some(2500.0));
        assert_eq!(total.latency, Some(3000.0));
    }

    #[test]
    fn test_mean_ignores_blocks_without_value() {
        let a = ModelPerformance {
            tps: Some(40.0),
            ..Default::default()
        };
        let b = ModelPerformance {
            duration: Some(10.0),
            ..Default::default()
        };
        let c = ModelPerformance {
            tps: Some(80.0),
            ..Default::default()
        };

        let total = ModelPerformance::aggregate([&a, &b, &c]).unwrap();
        assert_eq!(total.tps, Some(60.0));
        assert_eq!(total.duration, Some(10.0));
    }

    #[test]
    fn test_first_skips_blocks_without_ttft() {
        let a = ModelPerformance {
            tps: Some(40.0),
            ..Default::default()
        };
        let b = ModelPerformance {
            ttft: Some(250.0),
            ..Default::default()
        };

        let total = ModelPerformance::aggregate([&a, &b]).unwrap();
        assert_eq!(total.ttft, Some(250.0));
    }

    #[test]
    fn test_aggregate_empty_is_none() {
        assert!(ModelUsage::aggregate([]).is_none());
        assert!(ModelPerformance::aggregate([&ModelPerformance::default()]).is_none());
        assert!(ModelUsage::default().is_empty());
        assert!(ModelPerformance::default().is_empty());
    }
}
