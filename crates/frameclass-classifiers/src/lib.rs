//! frameclass Classifiers
//!
//! Real-time image classification over two interchangeable inference
//! backends, driven by per-model JSON metadata:
//! - Tensor-graph: fixed-shape ONNX/TFLite graphs run by the tract interpreter,
//!   with descriptor-supplied pre- and post-normalization
//! - Traced-module: TorchScript modules (runtime supplied by a plugin), with
//!   fixed torchvision normalization
//!
//! Both sit behind the [`Classifier`] trait. [`ClassifierFactory`] picks the
//! variant from the model file extension and turns every load failure into
//! [`ClassifierAvailability::Unavailable`]. [`ActiveClassifier`] and
//! [`FramePipeline`] bind one classifier at a time to a live frame source.

pub mod active;
pub mod classifier;
pub mod config;
pub mod descriptor;
pub mod engine;
pub mod factory;
pub mod pipeline;
pub mod preprocess;
pub mod store;
pub mod tensor_graph;
pub mod topk;
pub mod traced_module;

pub use active::{ActiveClassifier, ClassifiedFrame};
pub use classifier::{BackendKind, Classifier};
pub use config::FrameclassConfig;
pub use descriptor::{ClassifierDescriptor, NormalizationParams};
pub use engine::{EngineLoader, InferenceEngine, UnavailableLoader};
pub use factory::{ClassifierAvailability, ClassifierFactory};
pub use pipeline::{FrameOutcome, FramePipeline, PipelineStats, PredictionFeed};
pub use preprocess::{InputTensor, TensorLayout};
pub use store::{ModelCatalog, ModelStore};
pub use tensor_graph::TensorGraphClassifier;
pub use topk::TOP_K;
pub use traced_module::TracedModuleClassifier;

#[cfg(feature = "tensor-graph")]
pub use tensor_graph::TractLoader;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::active::{ActiveClassifier, ClassifiedFrame};
    pub use crate::classifier::{BackendKind, Classifier};
    pub use crate::descriptor::ClassifierDescriptor;
    pub use crate::factory::{ClassifierAvailability, ClassifierFactory};
    pub use crate::pipeline::{FramePipeline, PredictionFeed};
    pub use crate::store::ModelStore;
    pub use frameclass_core::{Frame, Prediction};
}
