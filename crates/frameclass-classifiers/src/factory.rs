//! Classifier construction from descriptors
//!
//! The factory is the load-time failure boundary: a missing sidecar, a
//! missing or corrupt model file, or an unavailable runtime all come back as
//! [`ClassifierAvailability::Unavailable`] instead of an error.

use crate::classifier::{BackendKind, Classifier};
use crate::descriptor::ClassifierDescriptor;
use crate::engine::{EngineLoader, UnavailableLoader};
use crate::store::ModelStore;
use crate::tensor_graph::TensorGraphClassifier;
use crate::traced_module::TracedModuleClassifier;
use frameclass_core::Result;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of trying to build a classifier
pub enum ClassifierAvailability {
    /// Loaded and ready for frames
    Ready(Box<dyn Classifier>),
    /// Classification is unavailable for this model
    Unavailable { model: String, reason: String },
}

impl ClassifierAvailability {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn model(&self) -> &str {
        match self {
            Self::Ready(classifier) => classifier.name(),
            Self::Unavailable { model, .. } => model,
        }
    }

    pub fn into_classifier(self) -> Option<Box<dyn Classifier>> {
        match self {
            Self::Ready(classifier) => Some(classifier),
            Self::Unavailable { .. } => None,
        }
    }
}

impl fmt::Debug for ClassifierAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(classifier) => f
                .debug_struct("Ready")
                .field("model", &classifier.name())
                .field("backend", &classifier.backend())
                .finish(),
            Self::Unavailable { model, reason } => f
                .debug_struct("Unavailable")
                .field("model", model)
                .field("reason", reason)
                .finish(),
        }
    }
}

/// Builds the right classifier variant for a model file
#[derive(Clone)]
pub struct ClassifierFactory {
    store: ModelStore,
    tensor_graph_loader: Arc<dyn EngineLoader>,
    traced_loader: Arc<dyn EngineLoader>,
}

impl ClassifierFactory {
    /// Factory with the loaders compiled into this crate.
    ///
    /// The traced-module runtime is provided by a plugin; until one is set
    /// with [`with_traced_loader`](Self::with_traced_loader), traced models
    /// are reported as unavailable.
    pub fn new(store: ModelStore) -> Self {
        Self {
            store,
            tensor_graph_loader: default_tensor_graph_loader(),
            traced_loader: Arc::new(UnavailableLoader::new("traced-module")),
        }
    }

    pub fn with_tensor_graph_loader(mut self, loader: Arc<dyn EngineLoader>) -> Self {
        self.tensor_graph_loader = loader;
        self
    }

    pub fn with_traced_loader(mut self, loader: Arc<dyn EngineLoader>) -> Self {
        self.traced_loader = loader;
        self
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Backend a model file is routed to
    pub fn backend_for(&self, model: &str) -> BackendKind {
        BackendKind::for_model_name(model, self.store.traced_extension())
    }

    /// Build a classifier for a parsed descriptor
    pub fn create(&self, descriptor: ClassifierDescriptor) -> ClassifierAvailability {
        let model = descriptor.name.clone();
        match self.try_create(descriptor) {
            Ok(classifier) => {
                info!(
                    "Classifier ready: {} ({} backend, {} classes)",
                    model,
                    classifier.backend(),
                    classifier.descriptor().class_count()
                );
                ClassifierAvailability::Ready(classifier)
            }
            Err(e) => {
                warn!("Classifier unavailable for {}: {}", model, e);
                ClassifierAvailability::Unavailable {
                    model,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Resolve the model's sidecar through the store, then build
    pub fn create_for_model(&self, model: &str) -> ClassifierAvailability {
        match self.store.descriptor_for(model) {
            Ok(descriptor) => self.create(descriptor),
            Err(e) => {
                warn!("No descriptor for {}: {}", model, e);
                ClassifierAvailability::Unavailable {
                    model: model.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    fn try_create(&self, descriptor: ClassifierDescriptor) -> Result<Box<dyn Classifier>> {
        descriptor.validate()?;
        let path = self.store.model_path(&descriptor.name)?;

        match self.backend_for(&descriptor.name) {
            BackendKind::TracedModule => {
                let engine = self.traced_loader.load(&path, &descriptor)?;
                Ok(Box::new(TracedModuleClassifier::new(descriptor, engine)?))
            }
            BackendKind::TensorGraph => {
                let engine = self.tensor_graph_loader.load(&path, &descriptor)?;
                Ok(Box::new(TensorGraphClassifier::new(descriptor, engine)?))
            }
        }
    }
}

#[cfg(feature = "tensor-graph")]
fn default_tensor_graph_loader() -> Arc<dyn EngineLoader> {
    Arc::new(crate::tensor_graph::TractLoader::new())
}

#[cfg(not(feature = "tensor-graph"))]
fn default_tensor_graph_loader() -> Arc<dyn EngineLoader> {
    Arc::new(UnavailableLoader::new("tensor-graph"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file_is_unavailable() {
        let factory = ClassifierFactory::new(ModelStore::new("/nonexistent/assets"));
        let descriptor = ClassifierDescriptor::new("missing.tflite", 224, 224, ["a", "b"])
            .with_pre_normalization(127.5, 127.5);

        let availability = factory.create(descriptor);
        assert!(!availability.is_ready());
        assert_eq!(availability.model(), "missing.tflite");
    }

    #[test]
    fn test_missing_sidecar_is_unavailable() {
        let factory = ClassifierFactory::new(ModelStore::new("/nonexistent/assets"));
        let availability = factory.create_for_model("resnet.pt");
        assert!(matches!(
            availability,
            ClassifierAvailability::Unavailable { ref model, .. } if model == "resnet.pt"
        ));
    }

    #[test]
    fn test_backend_routing() {
        let factory = ClassifierFactory::new(ModelStore::new("assets"));
        assert_eq!(factory.backend_for("net.pt"), BackendKind::TracedModule);
        assert_eq!(factory.backend_for("net.tflite"), BackendKind::TensorGraph);

        let factory =
            ClassifierFactory::new(ModelStore::new("assets").with_traced_extension(".ptl"));
        assert_eq!(factory.backend_for("net.ptl"), BackendKind::TracedModule);
    }
}
