//! Per-model metadata sidecar

use frameclass_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Linear rescaling `(x - mean) / std`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct NormalizationParams {
    pub mean: f32,
    pub std: f32,
}

impl NormalizationParams {
    pub const IDENTITY: Self = Self {
        mean: 0.0,
        std: 1.0,
    };

    pub fn new(mean: f32, std: f32) -> Self {
        Self { mean, std }
    }

    #[inline]
    pub fn apply(&self, value: f32) -> f32 {
        (value - self.mean) / self.std
    }

    fn validate(&self, field: &str) -> Result<()> {
        if !self.mean.is_finite() || !self.std.is_finite() || self.std == 0.0 {
            return Err(Error::descriptor(format!(
                "{} must have a finite mean and a finite non-zero std, got [{}, {}]",
                field, self.mean, self.std
            )));
        }
        Ok(())
    }
}

impl From<[f32; 2]> for NormalizationParams {
    fn from([mean, std]: [f32; 2]) -> Self {
        Self { mean, std }
    }
}

impl From<NormalizationParams> for [f32; 2] {
    fn from(params: NormalizationParams) -> Self {
        [params.mean, params.std]
    }
}

/// Everything needed to build a classifier for one model file.
///
/// Parsed once from the JSON sidecar that ships next to the model binary and
/// held for the lifetime of the classifier built from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierDescriptor {
    /// Model file name, including its extension
    pub name: String,

    /// Expected input width in pixels
    pub width: u32,

    /// Expected input height in pixels
    pub height: u32,

    /// Class labels; position is the index into the model's score vector
    pub classes: Vec<String>,

    /// Applied to input pixels by the tensor-graph backend
    #[serde(
        default,
        rename = "preProcessingNormalizationParams",
        skip_serializing_if = "Option::is_none"
    )]
    pub pre_normalization: Option<NormalizationParams>,

    /// Applied to output scores by the tensor-graph backend
    #[serde(
        default,
        rename = "postProcessingNormalizationParams",
        skip_serializing_if = "Option::is_none"
    )]
    pub post_normalization: Option<NormalizationParams>,
}

impl ClassifierDescriptor {
    /// Create a descriptor without normalization parameters
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        classes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            classes: classes.into_iter().map(Into::into).collect(),
            pre_normalization: None,
            post_normalization: None,
        }
    }

    pub fn with_pre_normalization(mut self, mean: f32, std: f32) -> Self {
        self.pre_normalization = Some(NormalizationParams::new(mean, std));
        self
    }

    pub fn with_post_normalization(mut self, mean: f32, std: f32) -> Self {
        self.post_normalization = Some(NormalizationParams::new(mean, std));
        self
    }

    /// Parse and validate a sidecar document
    pub fn from_json(json: &str) -> Result<Self> {
        let descriptor: Self = serde_json::from_str(json)
            .map_err(|e| Error::descriptor(format!("Failed to parse descriptor: {}", e)))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Load from a sidecar file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::descriptor(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    /// Check the structural invariants every backend relies on
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::descriptor("model name is empty"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::descriptor(format!(
                "{}: input dimensions must be positive, got {}x{}",
                self.name, self.width, self.height
            )));
        }
        if self.classes.is_empty() {
            return Err(Error::descriptor(format!(
                "{}: class label list is empty",
                self.name
            )));
        }
        if let Some(pre) = &self.pre_normalization {
            pre.validate("preProcessingNormalizationParams")?;
        }
        if let Some(post) = &self.post_normalization {
            post.validate("postProcessingNormalizationParams")?;
        }
        Ok(())
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    /// Post-normalization, or the identity transform when the sidecar omits it
    pub fn post_normalization_or_identity(&self) -> NormalizationParams {
        self.post_normalization.unwrap_or(NormalizationParams::IDENTITY)
    }
}
