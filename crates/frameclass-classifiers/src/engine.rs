//! Extension points for inference backends.

use crate::descriptor::ClassifierDescriptor;
use crate::preprocess::InputTensor;
use frameclass_core::{Error, Result};
use std::path::Path;

/// One loaded model handle.
///
/// Implementations wrap a concrete runtime (an ONNX/TFLite graph interpreter,
/// a TorchScript module, or a test double). The handle is exclusively owned by
/// the classifier that wraps it and is released when that classifier drops.
pub trait InferenceEngine: Send + Sync {
    /// Input shape the model itself declares, if it declares a concrete one
    fn input_shape(&self) -> Option<[usize; 4]>;

    /// Length of the output score vector, if known before running
    fn output_len(&self) -> Option<usize>;

    /// Run a forward pass and return the flattened score vector
    fn run(&self, input: &InputTensor) -> Result<Vec<f32>>;
}

/// Pluggable loader for one backend.
///
/// Implement this trait in external crates to provide runtime backends
/// (for example libtorch) without coupling this crate to heavyweight
/// native dependencies.
pub trait EngineLoader: Send + Sync {
    /// Load the model binary at `path`
    fn load(&self, path: &Path, descriptor: &ClassifierDescriptor)
        -> Result<Box<dyn InferenceEngine>>;

    /// Human readable runtime name, used in logs
    fn runtime(&self) -> &str;
}

/// Loader for a backend that is not compiled into this build
#[derive(Debug, Clone)]
pub struct UnavailableLoader {
    runtime: String,
}

impl UnavailableLoader {
    pub fn new(runtime: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
        }
    }
}

impl EngineLoader for UnavailableLoader {
    fn load(
        &self,
        path: &Path,
        _descriptor: &ClassifierDescriptor,
    ) -> Result<Box<dyn InferenceEngine>> {
        Err(Error::unsupported(format!(
            "{} runtime is not available in this build (model {})",
            self.runtime,
            path.display()
        )))
    }

    fn runtime(&self) -> &str {
        &self.runtime
    }
}
