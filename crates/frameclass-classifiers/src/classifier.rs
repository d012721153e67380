//! Classifier trait and common types

use crate::descriptor::ClassifierDescriptor;
use frameclass_core::{Prediction, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trait for all image classifiers
pub trait Classifier: Send + Sync {
    /// The single highest-confidence label for the image
    fn predict(&self, image: &RgbImage) -> Result<Prediction>;

    /// The `min(TOP_K, class count)` highest-confidence labels, best first
    fn top_k_predictions(&self, image: &RgbImage) -> Result<Vec<Prediction>>;

    /// Descriptor the classifier was built from
    fn descriptor(&self) -> &ClassifierDescriptor;

    /// Which backend runs this classifier
    fn backend(&self) -> BackendKind;

    /// Model file name
    fn name(&self) -> &str {
        &self.descriptor().name
    }
}

/// Inference backend family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Fixed-shape graph interpreter (TFLite / ONNX)
    TensorGraph,
    /// Traced module runtime (TorchScript)
    TracedModule,
}

impl BackendKind {
    /// Backend for a model file: the traced extension selects the traced-module
    /// runtime, anything else goes to the tensor-graph interpreter.
    pub fn for_model_name(name: &str, traced_extension: &str) -> Self {
        if name.ends_with(traced_extension) {
            Self::TracedModule
        } else {
            Self::TensorGraph
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TensorGraph => "tensor-graph",
            Self::TracedModule => "traced-module",
        }
    }

    /// The other backend
    pub fn other(&self) -> Self {
        match self {
            Self::TensorGraph => Self::TracedModule,
            Self::TracedModule => Self::TensorGraph,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tensor-graph" | "tensorgraph" | "tflite" | "onnx" => Ok(Self::TensorGraph),
            "traced-module" | "tracedmodule" | "torchscript" | "pytorch" => {
                Ok(Self::TracedModule)
            }
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

/// Pair ranked `(index, score)` entries with their labels.
///
/// Indices without a label are dropped rather than invented, so a classifier
/// never reports a label its descriptor does not contain.
pub(crate) fn label_ranked(
    descriptor: &ClassifierDescriptor,
    ranked: &[(usize, f32)],
) -> Vec<Prediction> {
    ranked
        .iter()
        .filter_map(|&(index, score)| {
            descriptor
                .label(index)
                .map(|label| Prediction::new(label, score))
        })
        .collect()
}
