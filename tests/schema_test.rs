//! Estimator & Score schema tests
//!
//! Choice enumerations, field limits, foreign keys and the human-readable
//! renderings of both records.

use arbiter_db::model::{LABEL_MAX_LEN, MODEL_CLASS_MAX_LEN, MODEL_FORM_MAX_LEN};
use arbiter_db::{
    CorpusId, Error, Estimator, EstimatorId, Metric, ModelType, Score, Store, UserId,
};
use chrono::{TimeZone, Utc};
use std::time::Duration;

fn aug_2() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2016, 8, 2, 9, 16, 7).unwrap()
}

fn forest_store() -> (Store, EstimatorId) {
    let mut store = Store::new();
    store.register_user(UserId::new(1), "bbengfort");

    let forest = store
        .create_estimator(
            Estimator::builder(ModelType::Classifier)
                .model_class("RandomForestClassifier")
                .owner(UserId::new(1))
                .created_at(aug_2())
                .build(),
        )
        .expect("create estimator");
    (store, forest.id())
}

// =============================================================================
// Estimator Tests
// =============================================================================

#[test]
fn test_estimator_render_without_class() {
    let mut store = Store::new();
    let svd = store
        .create_estimator(
            Estimator::builder(ModelType::Decomposition)
                .created_at(aug_2())
                .build(),
        )
        .unwrap();

    assert_eq!(
        store.render_estimator(svd.id()).unwrap(),
        "None Decomposition (2016-08-02)"
    );
}

#[test]
fn test_build_time_must_fit_column() {
    let mut store = Store::new();
    let err = store
        .create_estimator(
            Estimator::builder(ModelType::Classifier)
                .build_time(Duration::MAX)
                .build(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::OutOfRange {
            field: "build_time",
            ..
        }
    ));
    assert!(store.is_empty());

    let svc = store
        .create_estimator(
            Estimator::builder(ModelType::Classifier)
                .build_time(Duration::from_secs(90))
                .build(),
        )
        .unwrap();
    let err = store
        .update_estimator(svc.id(), |e| e.set_build_time(Some(Duration::MAX)))
        .unwrap_err();
    assert!(matches!(err, Error::OutOfRange { .. }));
    assert_eq!(
        store.get_estimator(svc.id()).unwrap().build_time(),
        Some(Duration::from_secs(90))
    );
}

#[test]
fn test_every_model_type_creates() {
    let mut store = Store::new();
    for model_type in ModelType::ALL {
        let estimator = store
            .create_estimator(Estimator::builder(model_type).build())
            .expect("valid model type");
        assert_eq!(estimator.model_type(), model_type);
    }
    assert_eq!(store.estimator_count(), 4);
}

#[test]
fn test_unknown_model_type_rejected() {
    for value in ["", "ranker", "CLASSIFIER", "classifiers"] {
        let err = value.parse::<ModelType>().unwrap_err();
        assert!(matches!(err, Error::InvalidChoice { field: "model_type", .. }));
    }
}

#[test]
fn test_estimator_fields() {
    let mut store = Store::new();
    store.register_user(UserId::new(3), "rebeccabilbro");
    store.register_corpus(CorpusId::new(9), "hobbies");

    let estimator = store
        .create_estimator(
            Estimator::builder(ModelType::Classifier)
                .model_class("MultinomialNB")
                .model_form("MultinomialNB(alpha=1.0)")
                .estimator(vec![0xde, 0xad])
                .build_time(Duration::from_secs(12))
                .owner(UserId::new(3))
                .corpus(CorpusId::new(9))
                .build(),
        )
        .unwrap();

    assert_eq!(estimator.id(), EstimatorId::new(1));
    assert_eq!(estimator.model_class(), Some("MultinomialNB"));
    assert_eq!(estimator.model_form(), Some("MultinomialNB(alpha=1.0)"));
    assert_eq!(estimator.estimator(), Some(&[0xde, 0xad][..]));
    assert_eq!(estimator.build_time(), Some(Duration::from_secs(12)));
    assert_eq!(estimator.owner(), Some(UserId::new(3)));
    assert_eq!(estimator.corpus(), Some(CorpusId::new(9)));
    assert_eq!(estimator.created(), estimator.modified());
}

#[test]
fn test_estimator_optional_fields_default_to_none() {
    let mut store = Store::new();
    let estimator = store
        .create_estimator(Estimator::builder(ModelType::Decomposition).build())
        .unwrap();

    assert!(estimator.model_class().is_none());
    assert!(estimator.model_form().is_none());
    assert!(estimator.estimator().is_none());
    assert!(estimator.build_time().is_none());
    assert!(estimator.owner().is_none());
    assert!(estimator.corpus().is_none());
    assert!(estimator.created().timestamp() > 0);
}

#[test]
fn test_estimator_length_limits() {
    let mut store = Store::new();

    assert!(store
        .create_estimator(
            Estimator::builder(ModelType::Regression)
                .model_class("a".repeat(MODEL_CLASS_MAX_LEN))
                .model_form("b".repeat(MODEL_FORM_MAX_LEN))
                .build()
        )
        .is_ok());

    let err = store
        .create_estimator(
            Estimator::builder(ModelType::Regression)
                .model_class("a".repeat(MODEL_CLASS_MAX_LEN + 1))
                .build(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::FieldTooLong {
            field: "model_class",
            max: 255,
            len: 256
        }
    ));
}

#[test]
fn test_estimator_unregistered_owner_rejected() {
    let mut store = Store::new();
    let err = store
        .create_estimator(
            Estimator::builder(ModelType::Classifier)
                .owner(UserId::new(42))
                .build(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::MissingReference { field: "owner_id", id: 42 }));
}

#[test]
fn test_estimator_unregistered_corpus_rejected() {
    let mut store = Store::new();
    let err = store
        .create_estimator(
            Estimator::builder(ModelType::Classifier)
                .corpus(CorpusId::new(5))
                .build(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::MissingReference { field: "corpus_id", id: 5 }));
}

#[test]
fn test_estimator_render_with_owner() {
    let (store, id) = forest_store();
    assert_eq!(
        store.render_estimator(id).unwrap(),
        "RandomForestClassifier Classifier (2016-08-02) for bbengfort"
    );
}

#[test]
fn test_estimator_render_without_owner() {
    let mut store = Store::new();
    let svc = store
        .create_estimator(
            Estimator::builder(ModelType::Regression)
                .model_class("SVR")
                .created_at(aug_2())
                .build(),
        )
        .unwrap();
    assert_eq!(store.render_estimator(svc.id()).unwrap(), "SVR Regression (2016-08-02)");
}

#[test]
fn test_estimator_render_unknown_id() {
    let store = Store::new();
    assert!(matches!(
        store.render_estimator(EstimatorId::new(1)),
        Err(Error::NotFound { entity: "estimator", id: 1 })
    ));
}

#[test]
fn test_estimator_serialization() {
    let (store, id) = forest_store();
    let estimator = store.get_estimator(id).unwrap();

    let json = serde_json::to_string(estimator).expect("serialization failed");
    assert!(json.contains("\"model_type\":\"classifier\""));

    let deserialized: Estimator = serde_json::from_str(&json).expect("deserialization failed");
    assert_eq!(&deserialized, estimator);
}

#[test]
fn test_estimator_serialization_rejects_bad_choice() {
    let (store, id) = forest_store();
    let json = serde_json::to_string(store.get_estimator(id).unwrap())
        .unwrap()
        .replace("\"classifier\"", "\"ranker\"");
    assert!(serde_json::from_str::<Estimator>(&json).is_err());
}

// =============================================================================
// Score Tests
// =============================================================================

#[test]
fn test_every_metric_creates() {
    let (mut store, id) = forest_store();
    for metric in Metric::ALL {
        store
            .create_score(Score::builder(id, metric).score(0.5).build())
            .expect("valid metric");
    }
    assert_eq!(store.scores_for(id).len(), Metric::ALL.len());
}

#[test]
fn test_score_requires_existing_estimator() {
    let mut store = Store::new();
    let err = store
        .create_score(Score::builder(EstimatorId::new(99), Metric::Accuracy).build())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::MissingReference {
            field: "estimator_id",
            id: 99
        }
    ));
    assert_eq!(store.score_count(), 0);
}

#[test]
fn test_unknown_metric_rejected() {
    assert!("rmse".parse::<Metric>().is_err());
    assert!(Metric::try_from("Accuracy").is_err());
}

#[test]
fn test_score_fields() {
    let (mut store, id) = forest_store();
    let score = store
        .create_score(
            Score::builder(id, Metric::Precision)
                .score(0.9)
                .label("spam")
                .folds(vec![0.88, 0.91, 0.91])
                .build(),
        )
        .unwrap();

    assert_eq!(score.estimator(), id);
    assert_eq!(score.metric(), Metric::Precision);
    assert_eq!(score.score(), Some(0.9));
    assert_eq!(score.label(), Some("spam"));
    assert_eq!(score.folds(), Some(&[0.88, 0.91, 0.91][..]));
}

#[test]
fn test_score_label_limit() {
    let (mut store, id) = forest_store();
    let err = store
        .create_score(
            Score::builder(id, Metric::Recall)
                .label("x".repeat(LABEL_MAX_LEN + 1))
                .build(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::FieldTooLong { field: "label", .. }));
}

#[test]
fn test_score_render() {
    let (mut store, id) = forest_store();
    let score = store
        .create_score(Score::builder(id, Metric::Accuracy).score(0.91234).build())
        .unwrap();

    assert_eq!(
        store.render_score(score.id()).unwrap(),
        "Accuracy score for RandomForestClassifier Classifier (2016-08-02) for bbengfort = 0.912"
    );
}

#[test]
fn test_score_render_with_label() {
    let (mut store, id) = forest_store();
    let score = store
        .create_score(
            Score::builder(id, Metric::F1)
                .score(0.5)
                .label("macro avg")
                .build(),
        )
        .unwrap();

    assert_eq!(
        store.render_score(score.id()).unwrap(),
        "Macro Avg F1 score for RandomForestClassifier Classifier (2016-08-02) for bbengfort = 0.500"
    );
}

#[test]
fn test_score_render_empty_label_has_no_prefix() {
    let (mut store, id) = forest_store();
    let score = store
        .create_score(Score::builder(id, Metric::F1).score(0.5).label("").build())
        .unwrap();

    assert_eq!(
        store.render_score(score.id()).unwrap(),
        "F1 score for RandomForestClassifier Classifier (2016-08-02) for bbengfort = 0.500"
    );
}

#[test]
fn test_score_render_rounds_to_three_places() {
    let (mut store, id) = forest_store();
    let score = store
        .create_score(Score::builder(id, Metric::Mcc).score(1.0).build())
        .unwrap();
    assert!(store.render_score(score.id()).unwrap().ends_with(" = 1.000"));
}

#[test]
fn test_score_serialization() {
    let (mut store, id) = forest_store();
    let score = store
        .create_score(Score::builder(id, Metric::R2).score(0.7).build())
        .unwrap();

    let json = serde_json::to_string(&score).unwrap();
    assert!(json.contains("\"metric\":\"r2\""));
    let deserialized: Score = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, score);
}
