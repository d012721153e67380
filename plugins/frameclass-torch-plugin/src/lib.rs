//! TorchScript runtime plugin for `frameclass-classifiers`.
//!
//! This crate provides a libtorch-backed implementation of `EngineLoader` for
//! traced-module models and can be injected with
//! `ClassifierFactory::with_traced_loader`.

pub mod torchscript_loader;

pub use torchscript_loader::{TorchScriptEngine, TorchScriptLoader};
