//! Fixed-shape graph interpreter backend
//!
//! Preprocessing runs in a fixed order: center-crop to a square on the shorter
//! side, nearest-neighbour resize to the model's declared input resolution,
//! then `(pixel - mean) / std` with the descriptor's pre-normalization pair.
//! Output scores go through the post-normalization pair before ranking.

use crate::classifier::{label_ranked, BackendKind, Classifier};
use crate::descriptor::{ClassifierDescriptor, NormalizationParams};
use crate::engine::InferenceEngine;
use crate::preprocess::{center_crop_square, resize_nearest, to_tensor_normalized, TensorLayout};
use crate::topk::{top_k_stable_sort, TOP_K};
use frameclass_core::{Error, Prediction, Result};
use image::RgbImage;
use tracing::{debug, warn};

#[cfg(feature = "tensor-graph")]
pub use tract_backend::TractLoader;

/// Classifier over a fixed-shape tensor graph
pub struct TensorGraphClassifier {
    descriptor: ClassifierDescriptor,
    engine: Box<dyn InferenceEngine>,
    input_shape: [usize; 4],
    layout: TensorLayout,
    pre_normalization: NormalizationParams,
    post_normalization: NormalizationParams,
}

impl TensorGraphClassifier {
    /// Wrap a loaded graph.
    ///
    /// The graph's own declared input shape wins over the descriptor's
    /// width/height; the descriptor is only consulted when the graph leaves
    /// its input shape open, in which case a channels-last input is assumed.
    pub fn new(descriptor: ClassifierDescriptor, engine: Box<dyn InferenceEngine>) -> Result<Self> {
        descriptor.validate()?;

        let pre_normalization = descriptor.pre_normalization.ok_or_else(|| {
            Error::descriptor(format!(
                "{}: preProcessingNormalizationParams is required by the tensor-graph backend",
                descriptor.name
            ))
        })?;
        let post_normalization = descriptor.post_normalization_or_identity();

        let (input_shape, layout) = match engine.input_shape() {
            Some(shape) => {
                let layout = TensorLayout::infer(&shape).ok_or_else(|| {
                    Error::model_load(format!(
                        "{}: declared input shape {:?} is not a 3-channel image",
                        descriptor.name, shape
                    ))
                })?;
                if shape[0] != 1 {
                    return Err(Error::model_load(format!(
                        "{}: declared batch size {} is not supported",
                        descriptor.name, shape[0]
                    )));
                }
                let (height, width) = layout.spatial(&shape);
                if (width, height) != (descriptor.width as usize, descriptor.height as usize) {
                    warn!(
                        "{}: model declares {}x{} input, descriptor says {}x{}; using the model's",
                        descriptor.name, width, height, descriptor.width, descriptor.height
                    );
                }
                (shape, layout)
            }
            None => {
                let layout = TensorLayout::ChannelsLast;
                let shape = layout.shape(descriptor.height as usize, descriptor.width as usize);
                (shape, layout)
            }
        };

        if let Some(len) = engine.output_len() {
            if len != descriptor.class_count() {
                return Err(Error::ShapeMismatch {
                    expected: descriptor.class_count(),
                    actual: len,
                });
            }
        }

        Ok(Self {
            descriptor,
            engine,
            input_shape,
            layout,
            pre_normalization,
            post_normalization,
        })
    }

    /// Input shape used for every frame
    pub fn input_shape(&self) -> [usize; 4] {
        self.input_shape
    }

    /// Post-normalized score per class, in label order
    pub fn scores(&self, image: &RgbImage) -> Result<Vec<f32>> {
        let (height, width) = self.layout.spatial(&self.input_shape);
        let cropped = center_crop_square(image);
        let resized = resize_nearest(&cropped, width as u32, height as u32)?;
        let tensor = to_tensor_normalized(&resized, self.layout, self.pre_normalization);
        tensor.check()?;

        let raw = self.engine.run(&tensor)?;
        if raw.len() != self.descriptor.class_count() {
            return Err(Error::ShapeMismatch {
                expected: self.descriptor.class_count(),
                actual: raw.len(),
            });
        }

        Ok(raw
            .into_iter()
            .map(|value| self.post_normalization.apply(value))
            .collect())
    }

    /// The `k` best labels after a stable descending sort
    pub fn top_k(&self, image: &RgbImage, k: usize) -> Result<Vec<Prediction>> {
        let scores = self.scores(image)?;
        let ranked = top_k_stable_sort(&scores, k);
        debug!(
            "{}: ranked {} of {} classes",
            self.descriptor.name,
            ranked.len(),
            scores.len()
        );
        Ok(label_ranked(&self.descriptor, &ranked))
    }
}

impl Classifier for TensorGraphClassifier {
    fn predict(&self, image: &RgbImage) -> Result<Prediction> {
        self.top_k(image, 1)?
            .into_iter()
            .next()
            .ok_or(Error::NoPrediction)
    }

    fn top_k_predictions(&self, image: &RgbImage) -> Result<Vec<Prediction>> {
        self.top_k(image, TOP_K)
    }

    fn descriptor(&self) -> &ClassifierDescriptor {
        &self.descriptor
    }

    fn backend(&self) -> BackendKind {
        BackendKind::TensorGraph
    }
}

#[cfg(feature = "tensor-graph")]
mod tract_backend {
    use crate::descriptor::ClassifierDescriptor;
    use crate::engine::{EngineLoader, InferenceEngine};
    use crate::preprocess::{InputTensor, TensorLayout};
    use frameclass_core::{Error, Result};
    use std::path::Path;
    use tract_onnx::prelude::*;
    use tract_onnx::tract_core::internal::DimLike;
    use tracing::info;

    fn load_err(path: &Path) -> impl Fn(TractError) -> Error + '_ {
        move |e| Error::model_load(format!("Failed to load {}: {}", path.display(), e))
    }

    /// Loads `.onnx` and `.tflite` graphs with the tract interpreter
    #[derive(Debug, Clone, Default)]
    pub struct TractLoader;

    impl TractLoader {
        pub fn new() -> Self {
            Self
        }

        fn load_tflite(path: &Path) -> Result<TypedModel> {
            tract_tflite::tflite()
                .model_for_path(path)
                .and_then(|model| model.into_optimized())
                .map_err(load_err(path))
        }

        fn load_onnx(path: &Path, descriptor: &ClassifierDescriptor) -> Result<TypedModel> {
            let model = tract_onnx::onnx()
                .model_for_path(path)
                .map_err(load_err(path))?;

            // Pin open dimensions (usually the batch) so the graph optimizes
            // to a single fixed input shape.
            let shape = {
                let probe = model.clone().into_typed().map_err(load_err(path))?;
                let fact = probe.input_fact(0).map_err(load_err(path))?;
                let dims: Vec<Option<usize>> =
                    fact.shape.iter().map(|dim| dim.to_usize().ok()).collect();
                fixed_input_shape(&dims, descriptor)?
            };

            model
                .with_input_fact(0, f32::fact(shape).into())
                .and_then(|model| model.into_optimized())
                .map_err(load_err(path))
        }
    }

    /// Resolve a possibly partially symbolic input shape to a concrete one
    pub(crate) fn fixed_input_shape(
        dims: &[Option<usize>],
        descriptor: &ClassifierDescriptor,
    ) -> Result<[usize; 4]> {
        if dims.len() != 4 {
            return Err(Error::model_load(format!(
                "{}: expected a 4-D image input, graph declares rank {}",
                descriptor.name,
                dims.len()
            )));
        }
        if let Some(batch) = dims[0].filter(|&batch| batch != 1) {
            return Err(Error::model_load(format!(
                "{}: declared batch size {} is not supported",
                descriptor.name, batch
            )));
        }
        let (height, width) = (descriptor.height as usize, descriptor.width as usize);
        let shape = if dims[1] == Some(3) {
            [1, 3, dims[2].unwrap_or(height), dims[3].unwrap_or(width)]
        } else {
            [1, dims[1].unwrap_or(height), dims[2].unwrap_or(width), 3]
        };
        Ok(shape)
    }

    impl EngineLoader for TractLoader {
        fn load(
            &self,
            path: &Path,
            descriptor: &ClassifierDescriptor,
        ) -> Result<Box<dyn InferenceEngine>> {
            let model = match path.extension().and_then(|ext| ext.to_str()) {
                Some("tflite") => Self::load_tflite(path)?,
                Some("onnx") => Self::load_onnx(path, descriptor)?,
                other => {
                    return Err(Error::unsupported(format!(
                        "tensor-graph backend cannot read '{}' files",
                        other.unwrap_or("")
                    )))
                }
            };

            let input_shape = model
                .input_fact(0)
                .ok()
                .and_then(|fact| fact.shape.as_concrete())
                .and_then(|dims| <[usize; 4]>::try_from(dims).ok());
            let output_len = model
                .output_fact(0)
                .ok()
                .and_then(|fact| fact.shape.as_concrete())
                .map(|dims| dims.iter().product());
            let input_type = model.input_fact(0).map_err(load_err(path))?.datum_type;
            let output_type = model.output_fact(0).map_err(load_err(path))?.datum_type;

            let plan = model.into_runnable().map_err(load_err(path))?;

            info!(
                "Loaded tensor graph {} (input {:?} {:?}, {:?} {:?} outputs)",
                path.display(),
                input_type,
                input_shape,
                output_len,
                output_type
            );

            Ok(Box::new(TractEngine {
                plan,
                input_shape,
                input_type,
                output_len,
            }))
        }

        fn runtime(&self) -> &str {
            "tract"
        }
    }

    struct TractEngine {
        plan: TypedRunnableModel<TypedModel>,
        input_shape: Option<[usize; 4]>,
        input_type: DatumType,
        output_len: Option<usize>,
    }

    /// Build the graph input in the graph's own element type.
    ///
    /// Values are converted numerically, never quantized: a uint8 graph gets
    /// the normalized pixel values as raw bytes, the same way quantized
    /// models are fed pixel buffers.
    pub(crate) fn graph_input(input: &InputTensor, datum_type: DatumType) -> Result<Tensor> {
        let to_err =
            |e: TractError| Error::inference(format!("Failed to build input tensor: {}", e));
        let tensor = Tensor::from_shape(&input.shape, &input.data).map_err(to_err)?;
        let raw = tensor
            .cast_to_dt(datum_type.unquantized())
            .map_err(to_err)?
            .into_owned();
        Ok(raw.cast_to_dt(datum_type).map_err(to_err)?.into_owned())
    }

    /// Flatten a graph output into `f32` scores.
    ///
    /// Quantized outputs are read as their stored integers; rescaling them is
    /// the job of the descriptor's post-normalization pair.
    pub(crate) fn output_scores(output: &Tensor) -> Result<Vec<f32>> {
        let to_err = |e: TractError| Error::inference(format!("Unexpected output type: {}", e));
        let raw = output
            .cast_to_dt(output.datum_type().unquantized())
            .map_err(to_err)?;
        let scores = raw.cast_to::<f32>().map_err(to_err)?;
        Ok(scores.as_slice::<f32>().map_err(to_err)?.to_vec())
    }

    impl InferenceEngine for TractEngine {
        fn input_shape(&self) -> Option<[usize; 4]> {
            self.input_shape
        }

        fn output_len(&self) -> Option<usize> {
            self.output_len
        }

        fn run(&self, input: &InputTensor) -> Result<Vec<f32>> {
            if let Some(shape) = self.input_shape {
                if TensorLayout::infer(&shape) != Some(input.layout) || shape != input.shape {
                    return Err(Error::inference(format!(
                        "input tensor {:?} does not match graph input {:?}",
                        input.shape, shape
                    )));
                }
            }

            let tensor = graph_input(input, self.input_type)?;
            let outputs = self
                .plan
                .run(tvec!(tensor.into()))
                .map_err(|e| Error::inference(format!("Graph execution failed: {}", e)))?;
            let output = outputs
                .first()
                .ok_or_else(|| Error::inference("graph produced no outputs"))?;
            output_scores(output)
        }
    }

}
