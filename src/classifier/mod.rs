mod error;
mod labels;
mod network;
mod prediction;
mod utils;
pub mod builder;
#[allow(clippy::module_inception)]
mod classifier;
pub mod preprocess;

pub use error::{DecodeFailure, ImageDecodeError, ModelLoadError, NetworkError, PredictionError};
pub use labels::LabelTable;
pub use network::{ImageNetwork, OnnxNetwork};
pub use prediction::{Distribution, Prediction, ScoredLabel};
pub use preprocess::{PreprocessConfig, Preprocessor};
pub use classifier::Classifier;
pub use builder::ClassifierBuilder;

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file, if loaded from disk
    pub model_path: Option<String>,
    /// Width of the network output, when declared by the model
    pub num_classes: Option<usize>,
    /// Number of named classes in the label table
    pub num_labels: usize,
    /// The first few labels, for display
    pub sample_labels: Vec<String>,
    /// Side length of the square network input
    pub input_size: u32,
    pub resize_shorter: u32,
}
