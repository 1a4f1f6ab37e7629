use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use ndarray::Array4;

use super::error::{ImageDecodeError, ModelLoadError, NetworkError, PredictionError};
use super::labels::LabelTable;
use super::network::ImageNetwork;
use super::prediction::{Distribution, Prediction};
use super::preprocess::Preprocessor;
use super::utils::softmax;
use crate::{BuiltinModel, ModelManager};

/// A thread-safe image classifier: fixed preprocessing, one pretrained
/// network and a label table.
///
/// Immutable once built. Share it across threads with `Arc`:
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use snapclass::{Classifier, BuiltinModel};
/// use std::sync::Arc;
/// use std::thread;
///
/// let classifier = Arc::new(Classifier::load(BuiltinModel::ResNet50)?);
///
/// let classifier_clone = Arc::clone(&classifier);
/// thread::spawn(move || {
///     let prediction = classifier_clone.predict("cat.jpg", 5).unwrap();
///     println!("{}", prediction);
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Classifier {
    model_path: Option<PathBuf>,
    network: Box<dyn ImageNetwork>,
    preprocessor: Preprocessor,
    labels: Arc<LabelTable>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Loads a builtin model from the default cache. The files must already
    /// be downloaded; see [`ModelManager::ensure_model_downloaded`].
    ///
    /// Blocking and slow: keep it off interactive threads.
    pub fn load(model: BuiltinModel) -> Result<Self, ModelLoadError> {
        Self::builder().with_model(model)?.build()
    }

    /// Loads a builtin model from a specific cache.
    pub fn load_from(manager: &ModelManager, model: BuiltinModel) -> Result<Self, ModelLoadError> {
        Self::builder().with_model_from(manager, model)?.build()
    }

    pub(crate) fn from_parts(
        model_path: Option<PathBuf>,
        network: Box<dyn ImageNetwork>,
        preprocessor: Preprocessor,
        labels: Arc<LabelTable>,
    ) -> Self {
        Self {
            model_path,
            network,
            preprocessor,
            labels,
        }
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        let config = self.preprocessor.config();
        super::ClassifierInfo {
            model_path: self.model_path.as_ref().map(|p| p.to_string_lossy().to_string()),
            num_classes: self.network.num_classes(),
            num_labels: self.labels.len(),
            sample_labels: self.labels.iter().take(5).map(str::to_string).collect(),
            input_size: config.crop_size,
            resize_shorter: config.resize_shorter,
        }
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    /// Decodes the image at `path` into a `[1, 3, crop, crop]` network input.
    pub fn preprocess(&self, path: impl AsRef<Path>) -> Result<Array4<f32>, ImageDecodeError> {
        self.preprocessor.load(path.as_ref())
    }

    /// Runs the network and returns the full probability distribution.
    pub fn classify(&self, path: impl AsRef<Path>) -> Result<Distribution, PredictionError> {
        let path = path.as_ref();
        let input = self.preprocess(path)?;

        let scores = self.network.forward(input)?;
        if scores.nrows() == 0 {
            return Err(NetworkError::EmptyOutput.into());
        }
        let probabilities = softmax(scores.row(0))?;
        debug!("Classified {:?} over {} classes", path, probabilities.len());

        Ok(Distribution::new(probabilities, Arc::clone(&self.labels)))
    }

    /// Predicts the `top_k` most likely classes for the image at `path`.
    ///
    /// # Arguments
    /// * `path` - The image file to classify
    /// * `top_k` - How many classes to return; must be at least 1
    ///
    /// # Returns
    /// Exactly `top_k` entries sorted by confidence, highest first.
    ///
    /// # Example
    /// ```no_run
    /// # use snapclass::{Classifier, BuiltinModel};
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let classifier = Classifier::load(BuiltinModel::ResNet50)?;
    /// let prediction = classifier.predict("cat.jpg", 5)?;
    /// for entry in &prediction {
    ///     println!("{}: {:.2}", entry.label, entry.confidence);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn predict(&self, path: impl AsRef<Path>, top_k: usize) -> Result<Prediction, PredictionError> {
        if top_k == 0 {
            return Err(PredictionError::InvalidTopK(top_k));
        }
        let path = path.as_ref();
        let prediction = self.classify(path)?.top_k(top_k)?;
        Ok(prediction.with_source(path))
    }
}
