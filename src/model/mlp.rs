//! MLP win classifier
//!
//! Architecture: Input(features) → Hidden(..) → ReLU → Dropout → win_head(1)
//!
//! The win head emits a logit; the sigmoid of it is P(player 1 wins).

use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use burn::tensor::activation::{relu, sigmoid};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use std::fmt;

use super::{ModelKind, WinClassifier};
use crate::preprocess::TransformedRecord;
use crate::{ArtifactKind, Result, TennisError};

/// Configuration for the MLP model
#[derive(Debug, Clone, PartialEq)]
pub struct MlpConfig {
    /// Input dimension (transformed feature count)
    pub input_dim: usize,
    /// Hidden layer dimensions (e.g., [64, 32] for two layers)
    pub hidden_dims: Vec<usize>,
    /// Dropout rate (inactive at inference)
    pub dropout: f64,
}

impl MlpConfig {
    pub fn new(input_dim: usize, hidden_dims: Vec<usize>, dropout: f64) -> Self {
        MlpConfig {
            input_dim,
            hidden_dims,
            dropout,
        }
    }
}

/// A single hidden layer block: Linear → ReLU → Dropout
#[derive(Module, Debug)]
pub struct HiddenBlock<B: Backend> {
    linear: Linear<B>,
    dropout: Dropout,
}

impl<B: Backend> HiddenBlock<B> {
    pub fn new(device: &B::Device, in_dim: usize, out_dim: usize, dropout: f64) -> Self {
        HiddenBlock {
            linear: LinearConfig::new(in_dim, out_dim).init(device),
            dropout: DropoutConfig::new(dropout).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.linear.forward(x);
        let x = relu(x);
        self.dropout.forward(x)
    }
}

/// Stack of hidden blocks followed by a single-logit win head
///
/// Depth comes from `MlpConfig::hidden_dims`: one block per entry, each
/// fed by the previous block's width, so the stack is a `Vec` rather than
/// fixed `hidden1`/`hidden2` fields. An empty list makes the net a single
/// linear layer from the features to the logit.
#[derive(Module, Debug)]
pub struct WinNet<B: Backend> {
    hidden: Vec<HiddenBlock<B>>,
    win_head: Linear<B>,
}

impl<B: Backend> WinNet<B> {
    pub fn new(device: &B::Device, config: &MlpConfig) -> Self {
        let mut hidden = Vec::with_capacity(config.hidden_dims.len());
        let mut in_dim = config.input_dim;
        for &out_dim in &config.hidden_dims {
            hidden.push(HiddenBlock::new(device, in_dim, out_dim, config.dropout));
            in_dim = out_dim;
        }

        WinNet {
            hidden,
            win_head: LinearConfig::new(in_dim, 1).init(device),
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `features` - Transformed features [batch, input_dim]
    ///
    /// # Returns
    /// Win logit [batch, 1] - apply sigmoid for P(player 1 wins)
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self
            .hidden
            .iter()
            .fold(features, |x, block| block.forward(x));
        self.win_head.forward(x)
    }
}

fn check_config(config: &MlpConfig, feature_names: &[String]) -> Result<()> {
    if config.input_dim != feature_names.len() {
        return Err(TennisError::artifact(
            ArtifactKind::Model,
            format!(
                "MLP input dimension {} does not match {} features",
                config.input_dim,
                feature_names.len()
            ),
        ));
    }
    if config.hidden_dims.contains(&0) {
        return Err(TennisError::artifact(
            ArtifactKind::Model,
            "MLP hidden layers must have at least one unit",
        ));
    }
    if !(0.0..1.0).contains(&config.dropout) {
        return Err(TennisError::artifact(
            ArtifactKind::Model,
            format!("MLP dropout {} is outside [0, 1)", config.dropout),
        ));
    }
    Ok(())
}

/// MLP classifier bound to the feature names it was trained on
pub struct MlpClassifier<B: Backend> {
    model: WinNet<B>,
    config: MlpConfig,
    feature_names: Vec<String>,
    device: B::Device,
}

impl<B: Backend> MlpClassifier<B> {
    /// Create a freshly initialised classifier
    pub fn new(device: B::Device, feature_names: Vec<String>, config: MlpConfig) -> Result<Self> {
        check_config(&config, &feature_names)?;
        let model = WinNet::new(&device, &config);
        Ok(MlpClassifier {
            model,
            config,
            feature_names,
            device,
        })
    }

    /// Save model weights (Burn adds the .mpk extension)
    pub fn save(&self, path: &str) -> Result<()>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        recorder
            .record(self.model.clone().into_record(), path.into())
            .map_err(|e| TennisError::Io(std::io::Error::other(e.to_string())))
    }

    /// Load model weights saved by [`MlpClassifier::save`]
    pub fn load(
        device: B::Device,
        path: &str,
        feature_names: Vec<String>,
        config: MlpConfig,
    ) -> Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let path = path.strip_suffix(".mpk").unwrap_or(path);
        let file = format!("{}.mpk", path);
        if !std::path::Path::new(&file).exists() {
            return Err(TennisError::artifact(
                ArtifactKind::Model,
                format!("model file {} not found", file),
            ));
        }

        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let record = recorder
            .load(path.into(), &device)
            .map_err(|e| TennisError::artifact(ArtifactKind::Model, e.to_string()))?;

        let mut classifier = Self::new(device, feature_names, config)?;
        classifier.model = classifier.model.load_record(record);
        Ok(classifier)
    }
}

impl<B: Backend> fmt::Debug for MlpClassifier<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MlpClassifier")
            .field("config", &self.config)
            .field("features", &self.feature_names.len())
            .finish()
    }
}

impl<B: Backend> WinClassifier for MlpClassifier<B> {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_proba(&self, record: &TransformedRecord) -> Result<f64> {
        record.ensure_features(&self.feature_names)?;

        let values: Vec<f32> = record.features().iter().map(|&v| v as f32).collect();
        let input = Tensor::<B, 2>::from_data(
            TensorData::new(values, [1, self.config.input_dim]),
            &self.device,
        );
        let prob = sigmoid(self.model.forward(input));

        let data = prob
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| TennisError::Inference(format!("{:?}", e)))?;
        let p = data
            .first()
            .copied()
            .ok_or_else(|| TennisError::Inference("model returned no output".to_string()))?;

        if !p.is_finite() {
            return Err(TennisError::Inference(format!(
                "model produced non-finite probability {}",
                p
            )));
        }
        Ok(p as f64)
    }

    fn validate(&self) -> Result<()> {
        check_config(&self.config, &self.feature_names)
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Mlp
    }
}
