use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};

use super::classifier::Classifier;
use super::error::ModelLoadError;
use super::labels::LabelTable;
use super::network::{ImageNetwork, OnnxNetwork};
use super::preprocess::{PreprocessConfig, Preprocessor};
use crate::{BuiltinModel, ModelManager, runtime::RuntimeConfig};

/// A builder for constructing a Classifier with a fluent interface.
#[derive(Default, Debug)]
pub struct ClassifierBuilder {
    model_path: Option<PathBuf>,
    network: Option<Box<dyn ImageNetwork>>,
    labels: Option<LabelTable>,
    preprocess: PreprocessConfig,
    runtime_config: RuntimeConfig,
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use snapclass::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution.
    /// Only affects models loaded after this call.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Overrides the resize / crop / normalize settings
    pub fn with_preprocessing(mut self, config: PreprocessConfig) -> Self {
        self.preprocess = config;
        self
    }

    /// Loads a builtin model and its label table from the default cache.
    ///
    /// # Returns
    /// * `Result<Self, ModelLoadError>` - The builder instance if successful, or an error if:
    ///   - A network is already set
    ///   - The model is not downloaded
    ///   - The model or label file failed to load
    ///   - The model structure is invalid
    ///
    /// # Example
    /// ```no_run
    /// use snapclass::{ClassifierBuilder, BuiltinModel};
    ///
    /// let builder = ClassifierBuilder::new()
    ///     .with_model(BuiltinModel::ResNet50);
    /// ```
    pub fn with_model(self, model: BuiltinModel) -> Result<Self, ModelLoadError> {
        let manager = ModelManager::new_default()
            .map_err(|e| ModelLoadError::Build(format!("Failed to create model manager: {}", e)))?;
        self.with_model_from(&manager, model)
    }

    /// Like [`with_model`](Self::with_model), reading from a specific cache.
    pub fn with_model_from(
        self,
        manager: &ModelManager,
        model: BuiltinModel,
    ) -> Result<Self, ModelLoadError> {
        let info = model.get_model_info();
        if !manager.is_model_downloaded(&info.name) {
            return Err(ModelLoadError::NotDownloaded(info.name));
        }

        let characteristics = model.characteristics();
        if characteristics.input_size != self.preprocess.crop_size as usize {
            return Err(ModelLoadError::InvalidConfig(format!(
                "{} expects {}x{} input, preprocessing crops to {}",
                info.name, characteristics.input_size, characteristics.input_size, self.preprocess.crop_size
            )));
        }

        let labels = LabelTable::from_file(manager.get_labels_path(&info.name))?;
        let expected = characteristics.num_classes;
        if labels.len() != expected {
            warn!(
                "Label table for {} has {} entries, network emits {}",
                info.name,
                labels.len(),
                expected
            );
        }

        self.with_custom_model(manager.get_model_path(&info.name))
            .map(|builder| builder.with_labels(labels))
    }

    /// Sets a custom ONNX model file
    ///
    /// # Returns
    /// * `Result<Self, ModelLoadError>` - The builder instance if successful, or an error if:
    ///   - A network is already set
    ///   - The file doesn't exist
    ///   - The model failed to load or has an invalid structure
    pub fn with_custom_model(mut self, model_path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let model_path = model_path.as_ref();
        if model_path.as_os_str().is_empty() {
            return Err(ModelLoadError::Build("Model path cannot be empty".to_string()));
        }
        if self.network.is_some() {
            return Err(ModelLoadError::Build("Model already set".to_string()));
        }

        let network = OnnxNetwork::from_file(model_path, &self.runtime_config)?;
        self.model_path = Some(model_path.to_path_buf());
        self.network = Some(Box::new(network));
        Ok(self)
    }

    /// Uses an already constructed network.
    pub fn with_network(mut self, network: Box<dyn ImageNetwork>) -> Result<Self, ModelLoadError> {
        if self.network.is_some() {
            return Err(ModelLoadError::Build("Model already set".to_string()));
        }
        self.network = Some(network);
        Ok(self)
    }

    pub fn with_labels(mut self, labels: LabelTable) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Reads the label table from a file, one label per line.
    pub fn with_labels_file(self, path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let labels = LabelTable::from_file(path)?;
        Ok(self.with_labels(labels))
    }

    /// Builds and returns the final Classifier instance
    ///
    /// # Returns
    /// * `Result<Classifier, ModelLoadError>` - The constructed Classifier if successful, or an error if:
    ///   - No network has been set
    ///   - The preprocessing configuration is invalid
    pub fn build(self) -> Result<Classifier, ModelLoadError> {
        let network = self
            .network
            .ok_or_else(|| ModelLoadError::Build("A model must be set before building".to_string()))?;
        let preprocessor = Preprocessor::new(self.preprocess)?;

        let labels = match self.labels {
            Some(labels) => labels,
            None => {
                warn!("No label table configured, falling back to the 30-class ImageNet sample");
                LabelTable::imagenet_sample()
            }
        };

        if let Some(width) = network.num_classes() {
            if width > labels.len() {
                info!(
                    "Network emits {} classes, {} have no label and use placeholder names",
                    width,
                    width - labels.len()
                );
            }
        }

        Ok(Classifier::from_parts(
            self.model_path,
            network,
            preprocessor,
            Arc::new(labels),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::NetworkError;
    use ndarray::{Array2, Array4};

    #[derive(Debug)]
    struct Uniform;

    impl ImageNetwork for Uniform {
        fn forward(&self, _input: Array4<f32>) -> Result<Array2<f32>, NetworkError> {
            Ok(Array2::zeros((1, 4)))
        }
    }

    #[test]
    fn test_build_requires_network() {
        let result = ClassifierBuilder::new().build();
        assert!(matches!(result, Err(ModelLoadError::Build(_))));
    }

    #[test]
    fn test_network_can_only_be_set_once() {
        let result = ClassifierBuilder::new()
            .with_network(Box::new(Uniform))
            .and_then(|builder| builder.with_network(Box::new(Uniform)));
        assert!(matches!(result, Err(ModelLoadError::Build(_))));
    }

    #[test]
    fn test_missing_custom_model() {
        let result = ClassifierBuilder::new().with_custom_model("/nonexistent/model.onnx");
        assert!(matches!(result, Err(ModelLoadError::MissingFile(_))));
    }

    #[test]
    fn test_builtin_model_not_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        let result = ClassifierBuilder::new().with_model_from(&manager, BuiltinModel::ResNet50);
        assert!(matches!(result, Err(ModelLoadError::NotDownloaded(name)) if name == "resnet50"));
    }

    #[test]
    fn test_builtin_model_rejects_mismatched_crop() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        let name = BuiltinModel::ResNet50.get_model_info().name;
        std::fs::create_dir_all(dir.path().join(&name)).unwrap();
        std::fs::write(manager.get_model_path(&name), b"weights").unwrap();
        std::fs::write(manager.get_labels_path(&name), "tench\n").unwrap();

        let result = ClassifierBuilder::new()
            .with_preprocessing(PreprocessConfig {
                resize_shorter: 320,
                crop_size: 299,
                ..PreprocessConfig::default()
            })
            .with_model_from(&manager, BuiltinModel::ResNet50);
        assert!(matches!(result, Err(ModelLoadError::InvalidConfig(msg)) if msg.contains("224x224")));
    }

    #[test]
    fn test_default_labels_are_sample() {
        let classifier = ClassifierBuilder::new()
            .with_network(Box::new(Uniform))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(classifier.labels().len(), 30);
    }

    #[test]
    fn test_invalid_preprocessing_rejected() {
        let result = ClassifierBuilder::new()
            .with_preprocessing(PreprocessConfig {
                crop_size: 512,
                ..PreprocessConfig::default()
            })
            .with_network(Box::new(Uniform))
            .unwrap()
            .build();
        assert!(matches!(result, Err(ModelLoadError::InvalidConfig(_))));
    }
}
