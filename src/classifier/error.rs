use std::io;
use std::path::PathBuf;

use crate::model_manager::ModelError;

/// Errors raised while materialising a [`Classifier`](super::Classifier).
///
/// A load failure is fatal for an interactive session: the classify action
/// stays disabled and the error is reported once.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    /// A builtin model was requested but its files are not in the local cache
    #[error("Model '{0}' is not downloaded. Please download it first using ModelManager::download_model()")]
    NotDownloaded(String),
    /// A model file path does not exist
    #[error("Model file not found: {}", .0.display())]
    MissingFile(PathBuf),
    /// The model cache could not fetch or verify the files
    #[error("Failed to prepare model files: {0}")]
    Manager(#[from] ModelError),
    /// ONNX Runtime could not initialise or load the graph
    #[error("ONNX Runtime error: {0}")]
    Runtime(#[from] ort::Error),
    /// The ONNX Runtime environment failed to initialise earlier in this process
    #[error("ONNX Runtime environment unavailable: {0}")]
    Environment(String),
    /// The graph loaded but does not have the expected structure
    #[error("Invalid model: {0}")]
    InvalidModel(String),
    /// The label table file could not be read
    #[error("Failed to read label table {}: {source}", path.display())]
    Labels {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The label table file holds no labels
    #[error("Label table {} contains no labels", .0.display())]
    EmptyLabels(PathBuf),
    /// The preprocessing pipeline was configured with unusable values
    #[error("Invalid preprocessing configuration: {0}")]
    InvalidConfig(String),
    /// The builder was used incorrectly
    #[error("Build error: {0}")]
    Build(String),
    /// The background worker loading the model died before reporting
    #[error("Model loading stopped unexpectedly: {0}")]
    Worker(String),
}

/// Why an image file could not be turned into pixels.
#[derive(Debug, thiserror::Error)]
pub enum DecodeFailure {
    #[error("file not found")]
    Missing(#[source] io::Error),
    #[error("file is empty")]
    Empty,
    #[error("not a regular file")]
    NotAFile,
    #[error("file could not be read: {0}")]
    Unreadable(#[source] io::Error),
    #[error("unsupported or corrupt image data: {0}")]
    Format(#[source] image::ImageError),
}

/// Uniform error for every way an input image can fail to decode, regardless
/// of which decoder or I/O layer produced the underlying fault.
#[derive(Debug, thiserror::Error)]
#[error("Cannot process image {}: {kind}", path.display())]
pub struct ImageDecodeError {
    pub path: PathBuf,
    #[source]
    pub kind: DecodeFailure,
}

impl ImageDecodeError {
    pub fn new(path: impl Into<PathBuf>, kind: DecodeFailure) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Errors produced by an [`ImageNetwork`](super::ImageNetwork) forward pass.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("ONNX Runtime error: {0}")]
    Runtime(#[from] ort::Error),
    #[error("Unexpected network output shape {0:?}, expected [batch, classes]")]
    OutputShape(Vec<usize>),
    #[error("Network produced no class scores")]
    EmptyOutput,
    #[error("Network produced non-finite class scores")]
    NonFiniteScores,
    /// Failure reported by a network not backed by ONNX Runtime
    #[error("{0}")]
    Backend(String),
}

/// Errors surfaced by [`Classifier::predict`](super::Classifier::predict).
///
/// Recoverable: the caller may retry with another image. The original cause
/// is kept as the error source.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("top-k must be at least 1, got {0}")]
    InvalidTopK(usize),
    #[error("Prediction failed: {0}")]
    Decode(#[from] ImageDecodeError),
    #[error("Prediction failed: {0}")]
    Inference(#[from] NetworkError),
    /// The background worker running the prediction died before reporting
    #[error("Prediction failed: worker stopped unexpectedly: {0}")]
    Worker(String),
}
