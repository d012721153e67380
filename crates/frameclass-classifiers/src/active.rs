//! The single classifier bound to the live frame path.
//!
//! Inference holds the read lock for the whole forward pass; replacing the
//! classifier takes the write lock, so a switch waits for in-flight frames and
//! no frame can reach a handle after it has been released. Every switch bumps
//! the generation, which lets consumers discard results computed before it.
//! The generation is bumped under the write lock but read without taking the
//! lock, so async consumers never wait on a model load.

use crate::classifier::{BackendKind, Classifier};
use crate::factory::{ClassifierAvailability, ClassifierFactory};
use frameclass_core::Prediction;
use image::RgbImage;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Predictions for one frame, tagged with the classifier that produced them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedFrame {
    /// Generation of the active classifier at inference time
    pub generation: u64,
    pub model: String,
    pub backend: BackendKind,
    pub predictions: Vec<Prediction>,
}

/// Holder of the active classifier
pub struct ActiveClassifier {
    slot: RwLock<Option<Box<dyn Classifier>>>,
    generation: AtomicU64,
}

impl ActiveClassifier {
    /// Start with no classifier bound
    pub fn empty() -> Self {
        Self {
            slot: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Install the outcome of a factory call. An unavailable outcome leaves
    /// the slot empty. Returns the new generation.
    pub fn activate(&self, availability: ClassifierAvailability) -> u64 {
        let mut slot = self.slot.write();
        Self::release(&mut slot);
        *slot = match availability {
            ClassifierAvailability::Ready(classifier) => {
                info!("Activated {} ({})", classifier.name(), classifier.backend());
                Some(classifier)
            }
            ClassifierAvailability::Unavailable { model, reason } => {
                warn!("Classification disabled, {} unavailable: {}", model, reason);
                None
            }
        };
        self.bump()
    }

    /// Release the current classifier, then load and install `model`.
    ///
    /// The previous handle is dropped before the new model is loaded, so two
    /// models are never resident at once.
    pub fn switch_to(&self, factory: &ClassifierFactory, model: &str) -> u64 {
        let mut slot = self.slot.write();
        Self::release(&mut slot);
        let generation = self.bump();

        *slot = factory.create_for_model(model).into_classifier();
        if slot.is_some() {
            info!("Switched to {} (generation {})", model, generation);
        }
        generation
    }

    /// Unbind the current classifier
    pub fn deactivate(&self) -> u64 {
        let mut slot = self.slot.write();
        Self::release(&mut slot);
        self.bump()
    }

    fn release(slot: &mut Option<Box<dyn Classifier>>) {
        if let Some(previous) = slot.take() {
            debug!("Releasing {}", previous.name());
            drop(previous);
        }
    }

    /// Only called with the write lock held
    fn bump(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current generation. Never blocks, even while a switch is loading.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_available(&self) -> bool {
        self.slot.read().is_some()
    }

    pub fn model(&self) -> Option<String> {
        self.slot
            .read()
            .as_ref()
            .map(|classifier| classifier.name().to_string())
    }

    /// Top-K predictions for one frame.
    ///
    /// Returns `None` when no classifier is bound or inference fails; a
    /// failing frame is logged and skipped.
    pub fn classify(&self, image: &RgbImage) -> Option<ClassifiedFrame> {
        let slot = self.slot.read();
        let classifier = slot.as_ref()?;
        let generation = self.generation();

        match classifier.top_k_predictions(image) {
            Ok(predictions) => Some(ClassifiedFrame {
                generation,
                model: classifier.name().to_string(),
                backend: classifier.backend(),
                predictions,
            }),
            Err(e) => {
                warn!("Skipping frame for {}: {}", classifier.name(), e);
                None
            }
        }
    }

    /// Single best prediction for one frame, with the same failure policy as
    /// [`classify`](Self::classify)
    pub fn predict(&self, image: &RgbImage) -> Option<Prediction> {
        let slot = self.slot.read();
        let classifier = slot.as_ref()?;
        match classifier.predict(image) {
            Ok(prediction) => Some(prediction),
            Err(e) => {
                warn!("Skipping frame for {}: {}", classifier.name(), e);
                None
            }
        }
    }
}

impl Default for ActiveClassifier {
    fn default() -> Self {
        Self::empty()
    }
}
