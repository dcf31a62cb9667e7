//! Trained artifacts
//!
//! The model, the fitted transform and the category vocabulary are loaded
//! once at startup, cross-checked, and then only ever read.

pub mod schema;
pub mod vocabulary;

pub use schema::SchemaDescriptor;
pub use vocabulary::CategoryVocabulary;

use crate::features::MatchRecord;
use crate::model::{
    GradientBoostedTrees, InferenceBackend, MlpClassifier, MlpConfig, ModelKind, WinClassifier,
};
use crate::preprocess::PreprocessingPipeline;
use crate::{ArtifactKind, Config, Result, TennisError};

/// Read-only context shared by every prediction
#[derive(Debug)]
pub struct Artifacts {
    pipeline: PreprocessingPipeline,
    model: Box<dyn WinClassifier>,
    vocabulary: CategoryVocabulary,
}

impl Artifacts {
    /// Load and validate all three artifacts named in the config
    pub fn load(config: &Config) -> Result<Self> {
        let paths = &config.artifacts;

        let pipeline =
            PreprocessingPipeline::from_json_str(&read(ArtifactKind::Transform, &paths.transform_path)?)?;
        log::info!(
            "Loaded transform from {} ({} numeric, {} categorical columns)",
            paths.transform_path,
            pipeline.schema().numeric.len(),
            pipeline.schema().categorical.len()
        );

        let feature_names: Vec<String> =
            pipeline.schema().feature_names().map(str::to_string).collect();
        let model: Box<dyn WinClassifier> = match config.model.kind {
            ModelKind::GradientBoosted => Box::new(GradientBoostedTrees::from_json_str(&read(
                ArtifactKind::Model,
                &paths.model_path,
            )?)?),
            ModelKind::Mlp => {
                let mlp_config = MlpConfig::new(
                    feature_names.len(),
                    config.model.hidden_dims.clone(),
                    config.model.dropout,
                );
                Box::new(MlpClassifier::<InferenceBackend>::load(
                    Default::default(),
                    &paths.model_path,
                    feature_names,
                    mlp_config,
                )?)
            }
        };
        log::info!("Loaded {} model from {}", model.kind(), paths.model_path);

        let vocabulary =
            CategoryVocabulary::from_json_str(&read(ArtifactKind::Vocabulary, &paths.vocabulary_path)?)?;
        log::info!(
            "Loaded vocabulary from {} ({} fields)",
            paths.vocabulary_path,
            vocabulary.len()
        );

        Self::from_parts(pipeline, model, vocabulary)
    }

    /// Assemble a context from already-parsed artifacts, checking the model's
    /// structure and that the artifacts agree with each other and with the
    /// assembled row layout
    pub fn from_parts(
        pipeline: PreprocessingPipeline,
        model: Box<dyn WinClassifier>,
        vocabulary: CategoryVocabulary,
    ) -> Result<Self> {
        model.validate()?;
        let schema = pipeline.schema();

        if schema.input_order.iter().map(String::as_str).ne(MatchRecord::COLUMNS) {
            return Err(TennisError::artifact(
                ArtifactKind::Transform,
                format!(
                    "transform was fitted on columns {:?}, match records provide {:?}",
                    schema.input_order,
                    MatchRecord::COLUMNS
                ),
            ));
        }

        if schema.feature_names().ne(model.feature_names().iter().map(String::as_str)) {
            return Err(TennisError::artifact(
                ArtifactKind::Model,
                format!(
                    "model features {:?} do not match transform output {:?}",
                    model.feature_names(),
                    schema.feature_names().collect::<Vec<_>>()
                ),
            ));
        }

        vocabulary.validate_against(&pipeline)?;

        Ok(Artifacts {
            pipeline,
            model,
            vocabulary,
        })
    }

    pub fn pipeline(&self) -> &PreprocessingPipeline {
        &self.pipeline
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        self.pipeline.schema()
    }

    pub fn model(&self) -> &dyn WinClassifier {
        self.model.as_ref()
    }

    pub fn vocabulary(&self) -> &CategoryVocabulary {
        &self.vocabulary
    }
}

fn read(artifact: ArtifactKind, path: &str) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| TennisError::artifact(artifact, format!("cannot read {}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::trees::{Tree, TreeNode};
    use crate::preprocess::{CategoricalColumn, NumericColumn};
    use std::collections::BTreeMap;

    const NUMERIC: [&str; 9] = [
        "player1_age",
        "player1_ht",
        "player1_rank",
        "player1_rank_points",
        "player2_age",
        "player2_ht",
        "player2_rank",
        "player2_rank_points",
        "match_num",
    ];
    const CATEGORICAL: [&str; 7] = [
        "player1_hand",
        "player1_ioc",
        "player2_hand",
        "player2_ioc",
        "round",
        "surface",
        "tourney_level",
    ];

    fn pipeline() -> PreprocessingPipeline {
        let schema = SchemaDescriptor {
            version: 1,
            input_order: MatchRecord::COLUMNS.iter().map(|c| c.to_string()).collect(),
            numeric: NUMERIC.iter().map(|c| c.to_string()).collect(),
            categorical: CATEGORICAL.iter().map(|c| c.to_string()).collect(),
            target: MatchRecord::TARGET.to_string(),
        };
        let numeric = NUMERIC
            .iter()
            .map(|name| NumericColumn {
                name: name.to_string(),
                fill: 0.0,
                scale: None,
            })
            .collect();
        let categorical = CATEGORICAL
            .iter()
            .map(|name| CategoricalColumn {
                name: name.to_string(),
                fill: "A".to_string(),
                levels: vec!["A".to_string(), "B".to_string()],
            })
            .collect();
        PreprocessingPipeline::new(schema, numeric, categorical).unwrap()
    }

    fn model(features: Vec<String>) -> Box<dyn WinClassifier> {
        Box::new(GradientBoostedTrees {
            feature_names: features,
            base_score: 0.0,
            trees: vec![Tree {
                nodes: vec![TreeNode::Leaf { value: 0.0 }],
            }],
        })
    }

    fn matching_model() -> Box<dyn WinClassifier> {
        model(NUMERIC.iter().chain(CATEGORICAL.iter()).map(|c| c.to_string()).collect())
    }

    fn vocabulary(values: Vec<&str>) -> CategoryVocabulary {
        let mut fields = BTreeMap::new();
        fields.insert(
            "surface".to_string(),
            values.into_iter().map(str::to_string).collect(),
        );
        CategoryVocabulary::new(fields)
    }

    #[test]
    fn test_from_parts() {
        let artifacts =
            Artifacts::from_parts(pipeline(), matching_model(), vocabulary(vec!["B", "A"])).unwrap();
        assert_eq!(artifacts.schema().feature_count(), 16);
        assert_eq!(artifacts.vocabulary().choices("surface").unwrap()[0], "B");
    }

    #[test]
    fn test_model_feature_mismatch() {
        let mut features: Vec<String> =
            NUMERIC.iter().chain(CATEGORICAL.iter()).map(|c| c.to_string()).collect();
        features.swap(0, 1);
        let err = Artifacts::from_parts(pipeline(), model(features), vocabulary(vec!["A"]))
            .unwrap_err();
        assert!(matches!(
            err,
            TennisError::ArtifactLoad {
                artifact: ArtifactKind::Model,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_invalid_tree() {
        let features: Vec<String> =
            NUMERIC.iter().chain(CATEGORICAL.iter()).map(|c| c.to_string()).collect();
        let split = |feature: usize, left: usize| Tree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold: 0.0,
                    left,
                    right: 2,
                },
                TreeNode::Leaf { value: 1.0 },
                TreeNode::Leaf { value: -1.0 },
            ],
        };

        for tree in [split(99, 1), split(0, 0)] {
            let model = Box::new(GradientBoostedTrees {
                feature_names: features.clone(),
                base_score: 0.0,
                trees: vec![tree],
            });
            let err = Artifacts::from_parts(pipeline(), model, vocabulary(vec!["A"])).unwrap_err();
            assert!(matches!(
                err,
                TennisError::ArtifactLoad {
                    artifact: ArtifactKind::Model,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_vocabulary_outside_levels() {
        let err = Artifacts::from_parts(pipeline(), matching_model(), vocabulary(vec!["A", "Z"]))
            .unwrap_err();
        assert!(matches!(
            err,
            TennisError::ArtifactLoad {
                artifact: ArtifactKind::Vocabulary,
                ..
            }
        ));
    }

    #[test]
    fn test_vocabulary_unknown_field() {
        let mut fields = BTreeMap::new();
        fields.insert("player1_age".to_string(), vec!["25".to_string()]);
        let err = Artifacts::from_parts(
            pipeline(),
            matching_model(),
            CategoryVocabulary::new(fields),
        )
        .unwrap_err();
        assert!(err.to_string().contains("player1_age"));
    }

    #[test]
    fn test_load_missing_files() {
        let mut config = Config::default();
        config.artifacts.transform_path = "/nonexistent/transform.json".to_string();
        let err = Artifacts::load(&config).unwrap_err();
        assert!(matches!(
            err,
            TennisError::ArtifactLoad {
                artifact: ArtifactKind::Transform,
                ..
            }
        ));
    }
}
