//! End-to-end predictions against the fixture artifacts in tests/fixtures

use std::path::PathBuf;

use tennis::artifacts::CategoryVocabulary;
use tennis::features::FeatureRow;
use tennis::model::trees::{GradientBoostedTrees, Tree, TreeNode};
use tennis::model::{InferenceBackend, MlpClassifier, MlpConfig, ModelKind, WinClassifier};
use tennis::preprocess::PreprocessingPipeline;
use tennis::Artifacts;
use tennis::preprocess::TransformedRecord;
use tennis::{
    ArtifactKind, Config, ErrorKind, MatchContext, MatchRecord, PlayerAttributes, Predictor, Side,
    TennisError,
};

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn fixture_config() -> Config {
    let mut config = Config::default();
    config.artifacts.model_path = fixture("best_lgbm.json");
    config.artifacts.transform_path = fixture("preprocessing_pipeline.json");
    config.artifacts.vocabulary_path = fixture("dict_categories.json");
    config
}

fn predictor() -> Predictor {
    Predictor::load(&fixture_config()).expect("fixture artifacts should load")
}

fn context() -> MatchContext {
    MatchContext::new(10, "R32", "Hard", "A")
}

fn assert_valid_distribution(result: &tennis::PredictionResult) {
    let total = result.player1.percent + result.player2.percent;
    assert!((total - 100.0).abs() <= 0.01, "percentages sum to {}", total);
    assert!(result.outcomes().iter().all(|o| (0.0..=100.0).contains(&o.percent)));
    let favored = result.outcome(result.favored).percent;
    let other = result.outcome(result.favored.other()).percent;
    assert!(favored >= other);
}

#[test]
fn identical_players_are_even() {
    let player = PlayerAttributes::new(27.0, "R", 188.0, "SRB", 12, 3500.0);
    let record = MatchRecord::new(player.clone(), player, context());

    let result = predictor().predict(&record).unwrap();
    assert_valid_distribution(&result);
    assert!((result.player1.percent - 50.0).abs() <= 5.0);
    assert!((result.player2.percent - 50.0).abs() <= 5.0);
}

#[test]
fn much_stronger_ranking_is_favored() {
    let record = MatchRecord::new(
        PlayerAttributes::new(25.0, "R", 185.0, "ESP", 1, 10000.0),
        PlayerAttributes::new(25.0, "R", 185.0, "ESP", 500, 50.0),
        context(),
    );

    let result = predictor().predict(&record).unwrap();
    assert_valid_distribution(&result);
    assert_eq!(result.favored, Side::Player1);
    assert_eq!(result.favored_label(), "Player 1");
    assert!(result.player1.percent > 80.0);

    let result = predictor().predict(&record.swapped()).unwrap();
    assert_eq!(result.favored, Side::Player2);
}

#[test]
fn boundary_inputs_produce_valid_distribution() {
    let player = PlayerAttributes::new(10.0, "R", 50.0, "USA", 0, 0.0);
    let record = MatchRecord::new(player.clone(), player, MatchContext::new(0, "R128", "Hard", "G"));

    let result = predictor().predict(&record).unwrap();
    assert_valid_distribution(&result);
    assert_eq!(result.outcomes().len(), 2);
}

#[test]
fn predict_is_idempotent() {
    let predictor = predictor();
    let record = MatchRecord::new(
        PlayerAttributes::new(33.0, "L", 183.0, "SUI", 3, 6200.0),
        PlayerAttributes::new(21.0, "R", 191.0, "FRA", 70, 900.0),
        context(),
    );

    let first = predictor.predict(&record).unwrap();
    let second = predictor.predict(&record).unwrap();
    assert_eq!(first, second);
}

#[test]
fn transform_output_relabels_to_golden_record() {
    let predictor = predictor();
    let record = MatchRecord::new(
        PlayerAttributes::new(30.0, "L", 190.0, "ESP", 1, 10000.0),
        PlayerAttributes::new(22.0, "R", 180.0, "FRA", 500, 50.0),
        MatchContext::new(50, "SF", "Clay", "G"),
    );

    let raw = predictor
        .artifacts()
        .pipeline()
        .transform(&record.to_row())
        .unwrap();
    let transformed = TransformedRecord::relabel(&raw, predictor.artifacts().schema()).unwrap();

    let expected = [
        ("player1_age", 1.0),
        ("player1_ht", 1.0),
        ("player1_rank", -0.99),
        ("player1_rank_points", 4.0),
        ("player2_age", -1.0),
        ("player2_ht", -1.0),
        ("player2_rank", 4.0),
        ("player2_rank_points", -0.975),
        ("match_num", 1.0),
        ("player1_hand", 1.0),
        ("player1_ioc", 1.0),
        ("player2_hand", 0.0),
        ("player2_ioc", 2.0),
        ("round", 5.0),
        ("surface", 1.0),
        ("tourney_level", 0.0),
    ];

    let names: Vec<_> = transformed.column_names().collect();
    let mut expected_names: Vec<_> = expected.iter().map(|(name, _)| *name).collect();
    expected_names.push("is_player1_winner");
    assert_eq!(names, expected_names);

    for (name, value) in expected {
        let actual = transformed.get(name).unwrap();
        assert!(
            (actual - value).abs() < 1e-9,
            "{}: expected {}, got {}",
            name,
            value,
            actual
        );
    }
    assert_eq!(transformed.get("is_player1_winner"), None);
    assert_eq!(raw.last(), Some(&None));
}

#[test]
fn missing_values_are_imputed() {
    let predictor = predictor();
    let transformed = predictor.transform(&MatchRecord::default()).unwrap();

    // Numeric fills equal the fitted means, so they standardize to zero
    assert_eq!(transformed.get("player1_age"), Some(0.0));
    assert_eq!(transformed.get("match_num"), Some(0.0));
    // Categorical fills: R, USA, R32, Hard, A
    assert_eq!(transformed.get("player1_hand"), Some(0.0));
    assert_eq!(transformed.get("player2_ioc"), Some(7.0));
    assert_eq!(transformed.get("round"), Some(2.0));
    assert_eq!(transformed.get("surface"), Some(0.0));
    assert_eq!(transformed.get("tourney_level"), Some(2.0));

    let result = predictor.predict(&MatchRecord::default()).unwrap();
    assert_valid_distribution(&result);
}

#[test]
fn missing_column_is_schema_mismatch() {
    let mut row = MatchRecord::default().to_row();
    row.remove("player2_rank");

    let err = predictor().predict_row(&row).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    assert!(err.to_string().contains("player2_rank"));
}

#[test]
fn unseen_category_is_rejected() {
    let record = MatchRecord::new(
        PlayerAttributes::new(25.0, "R", 185.0, "XYZ", 10, 1000.0),
        PlayerAttributes::new(25.0, "R", 185.0, "ESP", 10, 1000.0),
        context(),
    );

    let err = predictor().predict(&record).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Inference);
}

#[test]
fn json_batch_predictions() {
    let content = std::fs::read_to_string(fixture("matches.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    let rows: Vec<FeatureRow> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|item| FeatureRow::from_json_object(item.as_object().unwrap(), &MatchRecord::COLUMNS))
        .collect::<Result<_, _>>()
        .unwrap();

    let results = predictor().predict_batch(&rows);
    assert_eq!(results.len(), 2);

    let first = results[0].as_ref().unwrap();
    assert_eq!(first.favored, Side::Player1);

    let second = results[1].as_ref().unwrap();
    assert_eq!(second.player1.percent, 50.0);
    assert_eq!(second.favored, Side::Player1);
}

#[test]
fn json_row_with_wrong_type_is_schema_mismatch() {
    let mut value = serde_json::to_value(serde_json::Map::new()).unwrap();
    let object = value.as_object_mut().unwrap();
    for column in MatchRecord::COLUMNS {
        object.insert(column.to_string(), serde_json::Value::Null);
    }
    object.insert("player1_age".to_string(), serde_json::json!("twenty"));

    let row = FeatureRow::from_json_object(object, &MatchRecord::COLUMNS).unwrap();
    let err = predictor().predict_row(&row).unwrap_err();
    assert!(matches!(err, TennisError::SchemaMismatch(_)));
}

#[test]
fn labels_come_from_config() {
    let mut config = fixture_config();
    config.labels.player1 = "Djokovic".to_string();
    config.labels.player2 = "Alcaraz".to_string();
    let predictor = Predictor::load(&config).unwrap();

    let record = MatchRecord::new(
        PlayerAttributes::new(36.0, "R", 188.0, "SRB", 1, 11000.0),
        PlayerAttributes::new(20.0, "R", 183.0, "ESP", 300, 100.0),
        context(),
    );
    let result = predictor.predict(&record).unwrap();
    assert_eq!(result.favored_label(), "Djokovic");
    assert_eq!(result.ranked()[1].label, "Alcaraz");
}

#[test]
fn missing_artifact_fails_load() {
    let mut config = fixture_config();
    config.artifacts.vocabulary_path = fixture("does_not_exist.json");

    let err = Predictor::load(&config).unwrap_err();
    assert!(matches!(
        err,
        TennisError::ArtifactLoad {
            artifact: ArtifactKind::Vocabulary,
            ..
        }
    ));
}

#[test]
fn vocabulary_outside_fitted_levels_fails_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dict_categories.json");
    std::fs::write(&path, r#"{ "surface": ["Hard", "Ice"] }"#).unwrap();

    let mut config = fixture_config();
    config.artifacts.vocabulary_path = path.to_string_lossy().into_owned();

    let err = Predictor::load(&config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArtifactLoad);
    assert!(err.to_string().contains("Ice"));
}

#[test]
fn unsupported_schema_version_fails_load() {
    let content = std::fs::read_to_string(fixture("preprocessing_pipeline.json")).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&content).unwrap();
    value["schema"]["version"] = serde_json::json!(7);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preprocessing_pipeline.json");
    std::fs::write(&path, value.to_string()).unwrap();

    let mut config = fixture_config();
    config.artifacts.transform_path = path.to_string_lossy().into_owned();

    let err = Predictor::load(&config).unwrap_err();
    assert!(matches!(
        err,
        TennisError::ArtifactLoad {
            artifact: ArtifactKind::Transform,
            ..
        }
    ));
}

#[test]
fn reordered_input_columns_fail_load() {
    let content = std::fs::read_to_string(fixture("preprocessing_pipeline.json")).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&content).unwrap();
    let order = value["schema"]["input_order"].as_array_mut().unwrap();
    order.swap(0, 1);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preprocessing_pipeline.json");
    std::fs::write(&path, value.to_string()).unwrap();

    let mut config = fixture_config();
    config.artifacts.transform_path = path.to_string_lossy().into_owned();

    let err = Predictor::load(&config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArtifactLoad);
}

/// Single split on `feature`, with otherwise well-formed children
fn hand_built_model(feature_names: Vec<String>, feature: usize) -> GradientBoostedTrees {
    GradientBoostedTrees {
        feature_names,
        base_score: 0.0,
        trees: vec![Tree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold: 0.0,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: 0.5 },
                TreeNode::Leaf { value: -0.5 },
            ],
        }],
    }
}

#[test]
fn hand_built_model_with_bad_feature_fails_assembly() {
    let pipeline = PreprocessingPipeline::from_json_str(
        &std::fs::read_to_string(fixture("preprocessing_pipeline.json")).unwrap(),
    )
    .unwrap();
    let vocabulary = CategoryVocabulary::from_json_str(
        &std::fs::read_to_string(fixture("dict_categories.json")).unwrap(),
    )
    .unwrap();
    let features: Vec<String> = pipeline.schema().feature_names().map(str::to_string).collect();

    let model = hand_built_model(features, 99);
    let err = Artifacts::from_parts(pipeline, Box::new(model), vocabulary).unwrap_err();
    assert!(matches!(
        err,
        TennisError::ArtifactLoad {
            artifact: ArtifactKind::Model,
            ..
        }
    ));
}

#[test]
fn unvalidated_model_reports_inference_error() {
    let predictor = predictor();
    let features: Vec<String> = predictor
        .artifacts()
        .schema()
        .feature_names()
        .map(str::to_string)
        .collect();
    let transformed = predictor.transform(&MatchRecord::default()).unwrap();

    let model = hand_built_model(features, 99);
    let err = model.predict_proba(&transformed).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Inference);
}

#[test]
fn mlp_model_predicts_valid_distribution() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("win_mlp");
    let model_path = model_path.to_string_lossy().into_owned();

    let mut config = fixture_config();
    config.model.kind = ModelKind::Mlp;
    config.model.hidden_dims = vec![16, 8];
    config.artifacts.model_path = model_path.clone();

    // Feature names come from the transform schema
    let schema_predictor = predictor();
    let features: Vec<String> = schema_predictor
        .artifacts()
        .schema()
        .feature_names()
        .map(str::to_string)
        .collect();
    let mlp = MlpClassifier::<InferenceBackend>::new(
        Default::default(),
        features.clone(),
        MlpConfig::new(features.len(), vec![16, 8], config.model.dropout),
    )
    .unwrap();
    mlp.save(&model_path).unwrap();

    let predictor = Predictor::load(&config).unwrap();
    assert_eq!(predictor.artifacts().model().kind(), ModelKind::Mlp);

    let record = MatchRecord::new(
        PlayerAttributes::new(25.0, "R", 185.0, "ESP", 1, 10000.0),
        PlayerAttributes::new(25.0, "L", 185.0, "FRA", 500, 50.0),
        context(),
    );
    let result = predictor.predict(&record).unwrap();
    assert_valid_distribution(&result);
    assert_eq!(result, predictor.predict(&record).unwrap());
}
