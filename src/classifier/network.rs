use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use log::info;
use ndarray::{Array2, Array4, Ix2};
use ort::session::Session;
use ort::value::{Tensor, ValueType};

use super::error::{ModelLoadError, NetworkError};
use crate::runtime::{create_session_builder, RuntimeConfig};

/// A pretrained image network: one forward pass from a normalized
/// `[1, 3, H, W]` tensor to raw class scores `[1, classes]`.
///
/// Implementations must be safe to call from several threads at once;
/// [`Classifier`](super::Classifier) shares one instance across background tasks.
pub trait ImageNetwork: Send + Sync + fmt::Debug {
    /// Runs inference. No training state is kept between calls.
    fn forward(&self, input: Array4<f32>) -> Result<Array2<f32>, NetworkError>;

    /// Width of the output vector, when the network declares it up front.
    fn num_classes(&self) -> Option<usize> {
        None
    }
}

/// [`ImageNetwork`] backed by an ONNX Runtime session.
///
/// ONNX Runtime sessions only run inference, so no gradient bookkeeping is
/// ever allocated.
#[derive(Debug)]
pub struct OnnxNetwork {
    session: Session,
    input_name: String,
    num_classes: Option<usize>,
}

impl OnnxNetwork {
    /// Loads and validates an ONNX graph from disk.
    pub fn from_file(path: &Path, config: &RuntimeConfig) -> Result<Self, ModelLoadError> {
        if !path.exists() {
            return Err(ModelLoadError::MissingFile(path.to_path_buf()));
        }

        let session = create_session_builder(config)?.commit_from_file(path)?;
        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        let input_name = session.inputs[0].name.clone();
        let num_classes = match &session.outputs[0].output_type {
            ValueType::Tensor { dimensions, .. } => dimensions
                .last()
                .and_then(|width| usize::try_from(*width).ok())
                .filter(|width| *width > 0),
            _ => None,
        };

        info!(
            "Loaded ONNX model from {:?} (input '{}', {} output classes)",
            path,
            input_name,
            num_classes.map_or_else(|| "dynamic".to_string(), |n| n.to_string())
        );

        Ok(Self {
            session,
            input_name,
            num_classes,
        })
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session) -> Result<(), ModelLoadError> {
        if session.inputs.is_empty() {
            return Err(ModelLoadError::InvalidModel(
                "Model must have at least 1 input for the image tensor".to_string(),
            ));
        }
        if session.outputs.is_empty() {
            return Err(ModelLoadError::InvalidModel(
                "Model must have at least 1 output for class scores".to_string(),
            ));
        }
        Ok(())
    }
}

impl ImageNetwork for OnnxNetwork {
    fn forward(&self, input: Array4<f32>) -> Result<Array2<f32>, NetworkError> {
        let mut input_tensors = HashMap::new();
        input_tensors.insert(self.input_name.as_str(), Tensor::from_array(input)?);

        let outputs = self.session.run(input_tensors)?;
        let scores = outputs[0].try_extract_tensor::<f32>()?;

        let shape = scores.shape().to_vec();
        let scores = scores
            .into_dimensionality::<Ix2>()
            .map_err(|_| NetworkError::OutputShape(shape))?;
        Ok(scores.to_owned())
    }

    fn num_classes(&self) -> Option<usize> {
        self.num_classes
    }
}
