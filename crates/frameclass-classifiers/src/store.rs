//! Model asset directory: model binaries paired with JSON sidecars

use crate::classifier::BackendKind;
use crate::descriptor::ClassifierDescriptor;
use frameclass_core::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extension that routes a model to the traced-module backend
pub const TRACED_MODULE_EXTENSION: &str = ".pt";

/// Extensions listed under the tensor-graph backend
pub const TENSOR_GRAPH_EXTENSIONS: &[&str] = &[".tflite", ".onnx"];

/// Remove a file extension. With `all`, everything from the first dot is
/// removed; otherwise only the last extension. A leading dot never counts.
pub fn strip_extensions(filename: &str, all: bool) -> &str {
    let cut = if all {
        filename
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '.')
            .map(|(index, _)| index)
    } else {
        filename.rfind('.').filter(|&index| index > 0)
    };
    match cut {
        Some(index) => &filename[..index],
        None => filename,
    }
}

/// Model names bucketed by backend, each list sorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelCatalog {
    pub traced_module: Vec<String>,
    pub tensor_graph: Vec<String>,
}

impl ModelCatalog {
    pub fn models(&self, backend: BackendKind) -> &[String] {
        match backend {
            BackendKind::TracedModule => &self.traced_module,
            BackendKind::TensorGraph => &self.tensor_graph,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.traced_module.is_empty() && self.tensor_graph.is_empty()
    }

    pub fn len(&self) -> usize {
        self.traced_module.len() + self.tensor_graph.len()
    }

    pub fn contains(&self, model: &str) -> bool {
        self.traced_module.iter().chain(&self.tensor_graph).any(|m| m == model)
    }

    /// First model of the preferred backend, falling back to the other one
    pub fn default_model(&self, preferred: BackendKind) -> Option<(BackendKind, &str)> {
        [preferred, preferred.other()]
            .into_iter()
            .find_map(|backend| {
                self.models(backend)
                    .first()
                    .map(|model| (backend, model.as_str()))
            })
    }
}

/// Directory of bundled model assets
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
    traced_extension: String,
}

impl ModelStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            traced_extension: TRACED_MODULE_EXTENSION.to_string(),
        }
    }

    pub fn with_traced_extension(mut self, extension: impl Into<String>) -> Self {
        self.traced_extension = extension.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn traced_extension(&self) -> &str {
        &self.traced_extension
    }

    /// List every recognised model file in the directory
    pub fn catalog(&self) -> Result<ModelCatalog> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| {
            Error::config(format!(
                "Failed to read models directory {}: {}",
                self.root.display(),
                e
            ))
        })?;

        let mut catalog = ModelCatalog::default();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };

            if name.ends_with(&self.traced_extension) {
                catalog.traced_module.push(name);
            } else if TENSOR_GRAPH_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
                catalog.tensor_graph.push(name);
            }
        }

        catalog.traced_module.sort();
        catalog.tensor_graph.sort();
        debug!(
            "Found {} traced-module and {} tensor-graph models in {}",
            catalog.traced_module.len(),
            catalog.tensor_graph.len(),
            self.root.display()
        );
        Ok(catalog)
    }

    /// Absolute path of a model binary, which must exist
    pub fn model_path(&self, model: &str) -> Result<PathBuf> {
        if model.is_empty() || Path::new(model).components().count() != 1 {
            return Err(Error::model_load(format!("Invalid model name '{}'", model)));
        }
        let path = self.root.join(model);
        if !path.is_file() {
            return Err(Error::model_load(format!(
                "Model file not found: {}",
                path.display()
            )));
        }
        Ok(path)
    }

    /// Sidecar path: the model name without any extension, plus `.json`
    pub fn sidecar_path(&self, model: &str) -> PathBuf {
        self.root.join(format!("{}.json", strip_extensions(model, true)))
    }

    /// Load the descriptor that accompanies a model
    pub fn descriptor_for(&self, model: &str) -> Result<ClassifierDescriptor> {
        let descriptor = ClassifierDescriptor::from_file(self.sidecar_path(model))?;
        if descriptor.name != model {
            warn!(
                "Sidecar for {} names model {}; loading {}",
                model, descriptor.name, descriptor.name
            );
        }
        Ok(descriptor)
    }
}
