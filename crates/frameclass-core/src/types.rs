//! Core types for frameclass

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single labelled confidence score produced by a classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Class label, always taken from the model's descriptor
    pub label: String,

    /// Raw or normalized score; not guaranteed to be a probability
    pub confidence: f32,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    /// Confidence rendered as a percentage with one decimal place
    pub fn formatted_confidence(&self) -> String {
        format!("{:.1}%", self.confidence * 100.0)
    }

    /// Ordering by descending confidence. NaN sorts after every number.
    pub fn by_descending_confidence(a: &Self, b: &Self) -> Ordering {
        descending(a.confidence, b.confidence)
    }

    /// Two predictions refer to the same list item when their labels match
    pub fn same_item(&self, other: &Self) -> bool {
        self.label == other.label
    }

    /// Two items have the same contents when their confidences match
    pub fn same_contents(&self, other: &Self) -> bool {
        self.confidence == other.confidence
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Predicted: {}\nConfidence: {}",
            self.label,
            self.formatted_confidence()
        )
    }
}

/// Descending comparison of two scores with NaN placed last
pub fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// One decoded frame delivered by the frame source
#[derive(Debug, Clone)]
pub struct Frame {
    /// Monotonic sequence number assigned by the producer
    pub sequence: u64,

    /// Width x height RGB8 pixel buffer
    pub image: RgbImage,
}

impl Frame {
    /// Create a new frame
    pub fn new(sequence: u64, image: RgbImage) -> Self {
        Self { sequence, image }
    }

    /// Frame width in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
