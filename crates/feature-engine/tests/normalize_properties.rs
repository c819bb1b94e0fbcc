//! Encoding properties over the sample dataset.

use feature_engine::{
    FeatureSchema, HealthClass, InputError, InputNormalizer, RawRequest, TrainingDataset,
    CATEGORICAL_FIELDS,
};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;

const SAMPLE_CSV: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../testdata/coffee_health_sample.csv"
);

fn normalizer() -> InputNormalizer {
    let dataset = TrainingDataset::from_path(SAMPLE_CSV).expect("sample dataset");
    InputNormalizer::new(Arc::new(FeatureSchema::from_dataset(&dataset))).expect("normalizer")
}

fn category() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Male".to_string()),
        Just("Female".to_string()),
        Just("USA".to_string()),
        Just("Good".to_string()),
        Just("High".to_string()),
        Just("Office".to_string()),
        "[A-Za-z]{1,12}",
    ]
}

fn request_strategy() -> impl Strategy<Value = Value> {
    (
        (0.0f64..120.0, 10.0f64..50.0, 0.0f64..10.0, 0.0f64..1000.0, 0.0f64..14.0),
        (30i64..200, 0.0f64..20.0, 0i64..2, 0i64..2),
        (category(), category(), category(), category(), category()),
    )
        .prop_map(|((age, bmi, coffee, caffeine, sleep), (hr, pa, smoking, alcohol), cats)| {
            json!({
                "age": age, "bmi": bmi, "coffee_intake": coffee, "caffeine_mg": caffeine,
                "sleep_hours": sleep, "heart_rate": hr, "physical_activity": pa,
                "smoking": smoking, "alcohol_consumption": alcohol,
                "gender": cats.0, "country": cats.1, "occupation": cats.2,
                "sleep_quality": cats.3, "stress_level": cats.4
            })
        })
}

proptest! {
    #[test]
    fn prop_vector_matches_schema(value in request_strategy()) {
        let normalizer = normalizer();
        let request = RawRequest::from_json(value).unwrap();
        let vector = normalizer.normalize(&request).unwrap();

        prop_assert_eq!(vector.len(), normalizer.schema().len());
        prop_assert!(vector.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn prop_at_most_one_slot_per_group(value in request_strategy()) {
        let normalizer = normalizer();
        let schema = normalizer.schema();
        let vector = normalizer.normalize(&RawRequest::from_json(value).unwrap()).unwrap();

        for field in &CATEGORICAL_FIELDS {
            let prefix = format!("{}_", field.column);
            let hot = schema
                .names()
                .iter()
                .enumerate()
                .filter(|(_, name)| name.starts_with(&prefix))
                .filter(|(i, _)| vector.get(*i) == Some(1.0))
                .count();
            prop_assert!(hot <= 1);
        }
    }

    #[test]
    fn prop_garbage_age_is_input_error(age in "[a-z]{1,8}") {
        let normalizer = normalizer();
        let mut request = RawRequest::from_json(json!({
            "bmi": 24.5, "coffee_intake": 2, "caffeine_mg": 200, "sleep_hours": 7,
            "heart_rate": 70, "physical_activity": 3, "smoking": 0,
            "alcohol_consumption": 0, "gender": "Male", "country": "USA",
            "occupation": "Office", "sleep_quality": "Good", "stress_level": "Low"
        })).unwrap();
        request.insert("age", age);
        let is_invalid_number = matches!(
            normalizer.normalize(&request),
            Err(InputError::InvalidNumber { field: "age", .. })
        );
        prop_assert!(is_invalid_number);
    }
}

#[test]
fn sample_dataset_has_both_classes() {
    let dataset = TrainingDataset::from_path(SAMPLE_CSV).unwrap();
    let counts = dataset.class_counts();
    assert!(counts[HealthClass::Good.index()] > 0);
    assert!(counts[HealthClass::Issue.index()] > 0);
}

#[test]
fn unseen_country_leaves_group_empty() {
    let normalizer = normalizer();
    let schema = normalizer.schema();
    let request = RawRequest::from_json(json!({
        "age": 45, "bmi": 24.5, "coffee_intake": 2, "caffeine_mg": 200,
        "sleep_hours": 7, "heart_rate": 70, "physical_activity": 3,
        "smoking": 0, "alcohol_consumption": 0, "gender": "Male",
        "country": "Narnia", "occupation": "Engineer", "sleep_quality": "Good",
        "stress_level": "Low"
    }))
    .unwrap();
    let vector = normalizer.normalize(&request).unwrap();

    for (i, name) in schema.names().iter().enumerate() {
        if name.starts_with("Country_") || name.starts_with("Occupation_") {
            assert_eq!(vector.get(i), Some(0.0), "{name} should be unset");
        }
    }
    assert_eq!(vector.get(schema.index_of("Gender_Male").unwrap()), Some(1.0));
}
