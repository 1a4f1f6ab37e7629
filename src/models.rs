use serde::{Deserialize, Serialize};

/// Pretrained networks the application knows how to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum BuiltinModel {
    /// ResNet-50 v1 trained on ImageNet-1k
    #[value(name = "resnet50")]
    ResNet50,
}

/// Shape contract of a builtin model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCharacteristics {
    /// Side length of the square RGB input
    pub input_size: usize,
    /// Width of the class-score output
    pub num_classes: usize,
    pub model_size_mb: usize,
}

/// Where a model's files live and how to check them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Cache directory name
    pub name: String,
    pub model_url: String,
    pub labels_url: String,
    /// SHA-256 of the model file; unchecked when absent
    pub model_hash: Option<String>,
    /// SHA-256 of the label file; unchecked when absent
    pub labels_hash: Option<String>,
}

impl BuiltinModel {
    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            BuiltinModel::ResNet50 => ModelInfo {
                name: "resnet50".to_string(),
                model_url: "https://github.com/onnx/models/raw/main/validated/vision/classification/resnet/model/resnet50-v1-7.onnx".to_string(),
                labels_url: "https://raw.githubusercontent.com/pytorch/hub/master/imagenet_classes.txt".to_string(),
                model_hash: None,
                labels_hash: None,
            },
        }
    }

    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            BuiltinModel::ResNet50 => ModelCharacteristics {
                input_size: 224,
                num_classes: 1000,
                model_size_mb: 98,
            },
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BuiltinModel::ResNet50 => "ResNet-50 (ImageNet)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resnet50_info() {
        let info = BuiltinModel::ResNet50.get_model_info();
        assert_eq!(info.name, "resnet50");
        assert!(info.model_url.ends_with(".onnx"));

        let characteristics = BuiltinModel::ResNet50.characteristics();
        assert_eq!(characteristics.input_size, 224);
        assert_eq!(characteristics.num_classes, 1000);
    }

    #[test]
    fn test_custom_model_info_from_json() {
        let info: ModelInfo = serde_json::from_str(
            r#"{"name":"local","model_url":"file:///m.onnx","labels_url":"file:///l.txt","model_hash":"abc","labels_hash":null}"#,
        )
        .unwrap();
        assert_eq!(info.model_hash.as_deref(), Some("abc"));
        assert!(info.labels_hash.is_none());
    }
}
