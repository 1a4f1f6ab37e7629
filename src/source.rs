use std::path::PathBuf;

use log::info;

use crate::classifier::{Classifier, ModelLoadError, PreprocessConfig};
use crate::{BuiltinModel, ModelCharacteristics, ModelManager, RuntimeConfig};

/// Where the classifier's weights and labels come from.
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// A catalogue model fetched into the local cache
    Builtin {
        model: BuiltinModel,
        manager: ModelManager,
    },
    /// Files supplied by the user
    Custom {
        model_path: PathBuf,
        labels_path: Option<PathBuf>,
    },
}

impl ModelSource {
    /// Makes sure the files exist locally, downloading builtin models when needed.
    pub async fn prepare(&self, fresh: bool) -> Result<(), ModelLoadError> {
        match self {
            ModelSource::Builtin { model, manager } => {
                let info = model.get_model_info();
                if fresh {
                    info!("Fresh download requested - removing any existing model files...");
                    manager.remove_download(&info.name)?;
                }
                if !manager.is_model_downloaded(&info.name) {
                    info!(
                        "Fetching {} (about {} MB)",
                        model.display_name(),
                        model.characteristics().model_size_mb
                    );
                }
                manager.ensure_model_downloaded(&info).await?;
                Ok(())
            }
            ModelSource::Custom { model_path, .. } => {
                if model_path.exists() {
                    Ok(())
                } else {
                    Err(ModelLoadError::MissingFile(model_path.clone()))
                }
            }
        }
    }

    /// Builds a classifier from prepared files. Blocking.
    pub fn load(
        &self,
        runtime_config: &RuntimeConfig,
        preprocess: &PreprocessConfig,
    ) -> Result<Classifier, ModelLoadError> {
        let builder = Classifier::builder()
            .with_runtime_config(runtime_config.clone())
            .with_preprocessing(preprocess.clone());

        let builder = match self {
            ModelSource::Builtin { model, manager } => builder.with_model_from(manager, *model)?,
            ModelSource::Custom {
                model_path,
                labels_path,
            } => {
                let builder = builder.with_custom_model(model_path)?;
                match labels_path {
                    Some(path) => builder.with_labels_file(path)?,
                    None => builder,
                }
            }
        };
        builder.build()
    }

    /// Shape and size of a builtin model; unknown for custom files.
    pub fn characteristics(&self) -> Option<ModelCharacteristics> {
        match self {
            ModelSource::Builtin { model, .. } => Some(model.characteristics()),
            ModelSource::Custom { .. } => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ModelSource::Builtin { model, .. } => model.display_name().to_string(),
            ModelSource::Custom { model_path, .. } => format!("custom model {}", model_path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_source_missing_file() {
        let source = ModelSource::Custom {
            model_path: PathBuf::from("/nonexistent/model.onnx"),
            labels_path: None,
        };
        let result = tokio_test::block_on(source.prepare(false));
        assert!(matches!(result, Err(ModelLoadError::MissingFile(_))));

        let result = source.load(&RuntimeConfig::default(), &PreprocessConfig::default());
        assert!(matches!(result, Err(ModelLoadError::MissingFile(_))));
        assert!(source.characteristics().is_none());
    }

    #[test]
    fn test_builtin_source_requires_download() {
        let dir = tempfile::tempdir().unwrap();
        let source = ModelSource::Builtin {
            model: BuiltinModel::ResNet50,
            manager: ModelManager::new(dir.path()).unwrap(),
        };
        let result = source.load(&RuntimeConfig::default(), &PreprocessConfig::default());
        assert!(matches!(result, Err(ModelLoadError::NotDownloaded(_))));
        assert_eq!(source.describe(), "ResNet-50 (ImageNet)");

        let characteristics = source.characteristics().unwrap();
        assert_eq!(characteristics.model_size_mb, 98);
        assert_eq!(characteristics.input_size, 224);
    }
}
