use frameclass_classifiers::descriptor::ClassifierDescriptor;
use frameclass_classifiers::engine::{EngineLoader, InferenceEngine};
use frameclass_classifiers::preprocess::{InputTensor, TensorLayout};
use frameclass_core::{Error, Result};
use parking_lot::Mutex;
use std::path::Path;
use tch::{CModule, Device, Kind, Tensor};

/// libtorch-backed loader for traced-module (`.pt`) models.
#[derive(Debug, Clone, Copy)]
pub struct TorchScriptLoader {
    device: Device,
}

impl TorchScriptLoader {
    /// Loader that runs modules on the CPU
    pub fn new() -> Self {
        Self {
            device: Device::Cpu,
        }
    }

    /// Run modules on `device` instead
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }
}

impl Default for TorchScriptLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineLoader for TorchScriptLoader {
    fn load(
        &self,
        path: &Path,
        descriptor: &ClassifierDescriptor,
    ) -> Result<Box<dyn InferenceEngine>> {
        tracing::info!(
            "Loading TorchScript module '{}' from {}",
            descriptor.name,
            path.display()
        );

        let mut module = CModule::load_on_device(path, self.device).map_err(|e| {
            Error::model_load(format!(
                "Failed to load TorchScript module {}: {}",
                path.display(),
                e
            ))
        })?;
        module.set_eval();

        Ok(Box::new(TorchScriptEngine {
            module: Mutex::new(module),
            device: self.device,
        }))
    }

    fn runtime(&self) -> &str {
        "libtorch"
    }
}

/// A loaded TorchScript module.
///
/// Forward passes are serialized through a mutex; the module is freed when
/// the engine drops.
pub struct TorchScriptEngine {
    module: Mutex<CModule>,
    device: Device,
}

impl InferenceEngine for TorchScriptEngine {
    fn input_shape(&self) -> Option<[usize; 4]> {
        // Traced modules do not record their input shape
        None
    }

    fn output_len(&self) -> Option<usize> {
        None
    }

    fn run(&self, input: &InputTensor) -> Result<Vec<f32>> {
        input.check()?;
        if input.layout != TensorLayout::ChannelsFirst {
            return Err(Error::inference(
                "TorchScript modules expect a channels-first tensor",
            ));
        }

        let dims = input.shape.map(|dim| dim as i64);
        let tensor = Tensor::from_slice(&input.data)
            .view(dims)
            .to_device(self.device);

        let output = {
            let module = self.module.lock();
            tch::no_grad(|| module.forward_ts(&[tensor]))
        }
        .map_err(|e| Error::inference(format!("TorchScript forward failed: {}", e)))?;

        let scores = output.to_kind(Kind::Float).to_device(Device::Cpu).flatten(0, -1);
        Vec::<f32>::try_from(&scores)
            .map_err(|e| Error::inference(format!("Unreadable module output: {}", e)))
    }
}
