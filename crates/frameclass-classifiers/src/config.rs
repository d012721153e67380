//! Configuration for model discovery and the frame pipeline

use crate::classifier::BackendKind;
use crate::store::{ModelStore, TRACED_MODULE_EXTENSION};
use frameclass_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameclassConfig {
    /// Directory holding model binaries and their JSON sidecars
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Backend whose first model is selected when none is named
    #[serde(default = "default_preferred_backend")]
    pub preferred_backend: BackendKind,

    /// File extension routed to the traced-module backend
    #[serde(default = "default_traced_extension")]
    pub traced_extension: String,

    /// Frames waiting for classification before new ones are dropped
    #[serde(default = "default_frame_queue_capacity")]
    pub frame_queue_capacity: usize,
}

impl Default for FrameclassConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            preferred_backend: default_preferred_backend(),
            traced_extension: default_traced_extension(),
            frame_queue_capacity: default_frame_queue_capacity(),
        }
    }
}

impl FrameclassConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Load from file if it exists, otherwise use defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_queue_capacity == 0 {
            return Err(Error::config("frame_queue_capacity must be at least 1"));
        }
        if !self.traced_extension.starts_with('.') || self.traced_extension.len() < 2 {
            return Err(Error::config(format!(
                "traced_extension must look like '.pt', got '{}'",
                self.traced_extension
            )));
        }
        Ok(())
    }

    /// Model store rooted at `models_dir`
    pub fn model_store(&self) -> ModelStore {
        ModelStore::new(&self.models_dir).with_traced_extension(&self.traced_extension)
    }
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("./assets")
}

fn default_preferred_backend() -> BackendKind {
    BackendKind::TracedModule
}

fn default_traced_extension() -> String {
    TRACED_MODULE_EXTENSION.to_string()
}

fn default_frame_queue_capacity() -> usize {
    2
}
