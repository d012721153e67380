//! Mock engines and loaders for testing
//!
//! Provides configurable implementations of the engine seams so classifiers,
//! the factory, and the frame pipeline can be exercised without model files.

#![allow(dead_code)]

use frameclass_classifiers::descriptor::ClassifierDescriptor;
use frameclass_classifiers::engine::{EngineLoader, InferenceEngine};
use frameclass_classifiers::preprocess::InputTensor;
use frameclass_core::{Error, Result};
use image::{Rgb, RgbImage};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared log of load/release events, in order
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// An engine that returns a fixed score vector
pub struct MockEngine {
    scores: Vec<f32>,
    input_shape: Option<[usize; 4]>,
    output_len: Option<usize>,
    latency: Option<Duration>,
    calls: Arc<AtomicU32>,
    last_input: Arc<Mutex<Option<InputTensor>>>,
    label: String,
    events: Option<EventLog>,
}

impl MockEngine {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            input_shape: None,
            output_len: None,
            latency: None,
            calls: Arc::new(AtomicU32::new(0)),
            last_input: Arc::new(Mutex::new(None)),
            label: "mock".to_string(),
            events: None,
        }
    }

    /// Declare a model input shape
    pub fn with_input_shape(mut self, shape: [usize; 4]) -> Self {
        self.input_shape = Some(shape);
        self
    }

    /// Declare the output length up front
    pub fn with_output_len(mut self, len: usize) -> Self {
        self.output_len = Some(len);
        self
    }

    /// Simulate a slow forward pass
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Record a release event under `label` when dropped
    pub fn with_events(mut self, label: &str, events: EventLog) -> Self {
        self.label = label.to_string();
        self.events = Some(events);
        self
    }

    /// Counter of forward passes, shared with the engine
    pub fn calls(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.calls)
    }

    /// Last tensor passed to `run`, shared with the engine
    pub fn last_input(&self) -> Arc<Mutex<Option<InputTensor>>> {
        Arc::clone(&self.last_input)
    }
}

impl InferenceEngine for MockEngine {
    fn input_shape(&self) -> Option<[usize; 4]> {
        self.input_shape
    }

    fn output_len(&self) -> Option<usize> {
        self.output_len
    }

    fn run(&self, input: &InputTensor) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
        *self.last_input.lock() = Some(input.clone());
        Ok(self.scores.clone())
    }
}

impl Drop for MockEngine {
    fn drop(&mut self) {
        if let Some(events) = &self.events {
            events.lock().push(format!("release:{}", self.label));
        }
    }
}

/// An engine whose forward pass always fails
pub struct FailingEngine;

impl InferenceEngine for FailingEngine {
    fn input_shape(&self) -> Option<[usize; 4]> {
        None
    }

    fn output_len(&self) -> Option<usize> {
        None
    }

    fn run(&self, _input: &InputTensor) -> Result<Vec<f32>> {
        Err(Error::inference("Simulated engine failure"))
    }
}

/// A loader that hands out mock engines keyed by model file name
#[derive(Clone, Default)]
pub struct MockLoader {
    scores: HashMap<String, Vec<f32>>,
    latency: Option<Duration>,
    load_latency: Option<Duration>,
    events: EventLog,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: &str, scores: Vec<f32>) -> Self {
        self.scores.insert(model.to_string(), scores);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Simulate a slow model load
    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = Some(latency);
        self
    }

    pub fn events(&self) -> EventLog {
        Arc::clone(&self.events)
    }
}

impl EngineLoader for MockLoader {
    fn load(
        &self,
        path: &Path,
        _descriptor: &ClassifierDescriptor,
    ) -> Result<Box<dyn InferenceEngine>> {
        let model = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        let scores = self
            .scores
            .get(&model)
            .cloned()
            .ok_or_else(|| Error::model_load(format!("corrupt model {}", model)))?;
        if let Some(latency) = self.load_latency {
            std::thread::sleep(latency);
        }

        self.events.lock().push(format!("load:{}", model));
        let mut engine = MockEngine::new(scores).with_events(&model, self.events());
        if let Some(latency) = self.latency {
            engine = engine.with_latency(latency);
        }
        Ok(Box::new(engine))
    }

    fn runtime(&self) -> &str {
        "mock"
    }
}

/// A solid-colour test frame
pub fn solid_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([128, 64, 32]))
}

/// Write a model placeholder and its sidecar into `dir`
pub fn write_model(dir: &Path, model: &str, sidecar: &str) {
    std::fs::write(dir.join(model), b"model-bytes").unwrap();
    let stem = model.split('.').next().unwrap();
    std::fs::write(dir.join(format!("{}.json", stem)), sidecar).unwrap();
}

/// Sidecar JSON for a model
pub fn sidecar(model: &str, classes: &[&str], pre: Option<[f32; 2]>) -> String {
    let mut value = serde_json::json!({
        "name": model,
        "width": 8,
        "height": 8,
        "classes": classes,
    });
    if let Some(pre) = pre {
        value["preProcessingNormalizationParams"] = serde_json::json!(pre);
    }
    value.to_string()
}
