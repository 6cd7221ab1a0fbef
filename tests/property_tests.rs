//! Property-based tests for arbiter-db
//!
//! - Choice enumerations accept exactly their members
//! - Renderings follow their fixed patterns for arbitrary inputs
//! - Blobs decode to what was encoded
//! - Run with ProptestConfig::with_cases(100)

use arbiter_db::text::title_case;
use arbiter_db::{
    codec, Compression, Estimator, EstimatorId, Metric, ModelType, Score, ScoreId,
};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

fn arb_model_type() -> impl Strategy<Value = ModelType> {
    prop::sample::select(ModelType::ALL.to_vec())
}

fn arb_metric() -> impl Strategy<Value = Metric> {
    prop::sample::select(Metric::ALL.to_vec())
}

/// Dates between 2000-01-01 and 2037-12-31
fn arb_date() -> impl Strategy<Value = chrono::DateTime<Utc>> {
    (946_684_800i64..2_145_830_400i64).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

/// Weights with short binary expansions, so JSON text is exact
fn arb_weight() -> impl Strategy<Value = f64> {
    (-1_000_000i32..1_000_000).prop_map(|v| f64::from(v) / 1024.0)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: strings that are not a stored value never parse
    #[test]
    fn prop_unknown_choices_rejected(value in "[a-z0-9_]{0,16}") {
        let is_model_type = ModelType::ALL.iter().any(|t| t.as_str() == value);
        prop_assert_eq!(value.parse::<ModelType>().is_ok(), is_model_type);

        let is_metric = Metric::ALL.iter().any(|m| m.as_str() == value);
        prop_assert_eq!(value.parse::<Metric>().is_ok(), is_metric);
    }

    /// Property: title-casing is idempotent and preserves length in chars
    #[test]
    fn prop_title_case_idempotent(s in "[a-zA-Z0-9 _-]{0,32}") {
        let once = title_case(&s);
        prop_assert_eq!(title_case(&once), once.clone());
        prop_assert_eq!(once.chars().count(), s.chars().count());
    }

    /// Property: estimator rendering is "<class> <Type> (<date>)[ for <owner>]"
    #[test]
    fn prop_estimator_render_pattern(
        model_type in arb_model_type(),
        class in "[A-Za-z]{1,24}",
        owner in proptest::option::of("[a-z]{1,12}"),
        created in arb_date(),
    ) {
        let estimator = Estimator::builder(model_type)
            .model_class(class.clone())
            .created_at(created)
            .build()
            .into_estimator(EstimatorId::new(1));

        let mut expected = format!(
            "{class} {} ({})",
            model_type.title(),
            created.format("%Y-%m-%d")
        );
        if let Some(owner) = &owner {
            expected.push_str(&format!(" for {owner}"));
        }

        prop_assert_eq!(estimator.display(owner.as_deref()).to_string(), expected);
    }

    /// Property: score rendering ends with the value at three decimals
    #[test]
    fn prop_score_render_pattern(
        metric in arb_metric(),
        value in -1.0e6f64..1.0e6,
        label in proptest::option::of("[a-z]{1,10}"),
    ) {
        let estimator = Estimator::builder(ModelType::Classifier)
            .model_class("SGDClassifier")
            .build()
            .into_estimator(EstimatorId::new(1));

        let mut builder = Score::builder(estimator.id(), metric).score(value);
        if let Some(label) = &label {
            builder = builder.label(label.clone());
        }
        let score = builder.build().into_score(ScoreId::new(1));

        let rendered = score.display(estimator.display(None)).to_string();
        let suffix = format!(" = {value:.3}");
        let metric_part = format!("{} score for ", metric.title());
        prop_assert!(rendered.ends_with(&suffix));
        prop_assert!(rendered.contains(&metric_part));

        match &label {
            Some(label) => {
                let label_prefix = format!("{} ", title_case(label));
                prop_assert!(rendered.starts_with(&label_prefix))
            }
            None => prop_assert!(rendered.starts_with(&metric.title())),
        }
    }

    /// Property: blobs decode to the encoded value
    #[test]
    fn prop_blob_decodes(weights in proptest::collection::vec(arb_weight(), 0..64)) {
        let blob = codec::encode(&weights, Compression::None).unwrap();
        let decoded: Vec<f64> = codec::decode(&blob).unwrap();
        prop_assert_eq!(decoded, weights);
    }

    /// Property: any corruption of the magic bytes is rejected
    #[test]
    fn prop_blob_bad_magic(byte in any::<u8>(), pos in 0usize..4) {
        let mut blob = codec::encode(&[1.0f64, 2.0], Compression::None).unwrap();
        prop_assume!(blob[pos] != byte);
        blob[pos] = byte;
        prop_assert!(codec::inspect(&blob).is_err());
    }
}
