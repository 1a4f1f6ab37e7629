//! Image classification with a pretrained ONNX network, plus the session
//! controller that keeps a desktop shell responsive while it runs.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use snapclass::{Classifier, BuiltinModel};
//!
//! let classifier = Classifier::load(BuiltinModel::ResNet50)?;
//! let prediction = classifier.predict("tabby.jpg", 5)?;
//! println!("{}", prediction);
//! # Ok(())
//! # }
//! ```
//!
//! # Fetching weights
//!
//! Builtin models are downloaded into a local cache first:
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use snapclass::{BuiltinModel, ModelManager};
//!
//! let manager = ModelManager::new_default()?;
//! manager.ensure_model_downloaded(&BuiltinModel::ResNet50.get_model_info()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! A [`Classifier`] is immutable after loading and can be shared across
//! threads with `Arc`. [`session::SessionController`] does exactly that,
//! running each request on tokio's blocking pool.

pub mod classifier;
mod runtime;
pub mod model_manager;
pub mod models;
pub mod session;
pub mod source;

pub use classifier::{
    Classifier, ClassifierBuilder, ClassifierInfo, DecodeFailure, Distribution, ImageDecodeError,
    ImageNetwork, LabelTable, ModelLoadError, NetworkError, OnnxNetwork, Prediction,
    PredictionError, PreprocessConfig, Preprocessor, ScoredLabel,
};
pub use runtime::{RuntimeConfig, create_session_builder};
pub use model_manager::{ModelManager, ModelError};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};
pub use session::{ClassifyRejection, SessionController, SessionState};
pub use source::ModelSource;

/// Installs the process-wide logger. Call once, from the binary entry point.
///
/// `RUST_LOG` takes precedence over `default_filter`.
pub fn init_logger(default_filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}
