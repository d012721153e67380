//! Traced module runtime backend
//!
//! Frames are resized straight to the descriptor's width x height (no crop) and
//! normalized with the fixed torchvision constants; the descriptor's
//! normalization pairs are not used by this backend. Raw scores are ranked as
//! they come out of the module.

use crate::classifier::{label_ranked, BackendKind, Classifier};
use crate::descriptor::ClassifierDescriptor;
use crate::engine::InferenceEngine;
use crate::preprocess::{resize_nearest, to_tensor_torchvision};
use crate::topk::{argmax, top_k_bounded, TOP_K};
use frameclass_core::{Error, Prediction, Result};
use image::RgbImage;

/// Classifier over a traced (TorchScript) module
pub struct TracedModuleClassifier {
    descriptor: ClassifierDescriptor,
    engine: Box<dyn InferenceEngine>,
}

impl TracedModuleClassifier {
    pub fn new(descriptor: ClassifierDescriptor, engine: Box<dyn InferenceEngine>) -> Result<Self> {
        descriptor.validate()?;

        if let Some(len) = engine.output_len() {
            if len != descriptor.class_count() {
                return Err(Error::ShapeMismatch {
                    expected: descriptor.class_count(),
                    actual: len,
                });
            }
        }

        Ok(Self { descriptor, engine })
    }

    /// Raw score per class, in label order
    pub fn scores(&self, image: &RgbImage) -> Result<Vec<f32>> {
        let resized = resize_nearest(image, self.descriptor.width, self.descriptor.height)?;
        let tensor = to_tensor_torchvision(&resized);
        tensor.check()?;

        let scores = self.engine.run(&tensor)?;
        if scores.len() != self.descriptor.class_count() {
            return Err(Error::ShapeMismatch {
                expected: self.descriptor.class_count(),
                actual: scores.len(),
            });
        }
        Ok(scores)
    }
}

impl Classifier for TracedModuleClassifier {
    fn predict(&self, image: &RgbImage) -> Result<Prediction> {
        let scores = self.scores(image)?;
        let index = argmax(&scores).ok_or(Error::NoPrediction)?;
        let label = self.descriptor.label(index).ok_or(Error::NoPrediction)?;
        Ok(Prediction::new(label, scores[index]))
    }

    fn top_k_predictions(&self, image: &RgbImage) -> Result<Vec<Prediction>> {
        let scores = self.scores(image)?;
        Ok(label_ranked(&self.descriptor, &top_k_bounded(&scores, TOP_K)))
    }

    fn descriptor(&self) -> &ClassifierDescriptor {
        &self.descriptor
    }

    fn backend(&self) -> BackendKind {
        BackendKind::TracedModule
    }
}
