//! frameclass Core
//!
//! Core types and error handling shared across frameclass components.
//!
//! This crate provides:
//! - The error taxonomy used by loaders, classifiers and the frame pipeline
//! - `Prediction`, the labelled score returned to the presentation layer
//! - `Frame`, one decoded RGB image from the frame source

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Frame, Prediction};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{Frame, Prediction};
}
