use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use super::error::PredictionError;
use super::labels::LabelTable;
use super::utils::rank_indices;

/// One ranked class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLabel {
    pub class_index: usize,
    pub label: String,
    /// Probability in `[0, 1]`
    pub confidence: f32,
}

/// The top-k classes for one image, highest confidence first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    source: Option<PathBuf>,
    entries: Vec<ScoredLabel>,
}

impl Prediction {
    pub fn new(entries: Vec<ScoredLabel>) -> Self {
        Self {
            source: None,
            entries,
        }
    }

    pub(crate) fn with_source(mut self, path: &Path) -> Self {
        self.source = Some(path.to_path_buf());
        self
    }

    /// Image this prediction was computed for
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn entries(&self) -> &[ScoredLabel] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredLabel> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best(&self) -> Option<&ScoredLabel> {
        self.entries.first()
    }

    pub fn total_confidence(&self) -> f32 {
        self.entries.iter().map(|e| e.confidence).sum()
    }

    pub fn into_entries(self) -> Vec<ScoredLabel> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Prediction {
    type Item = &'a ScoredLabel;
    type IntoIter = std::slice::Iter<'a, ScoredLabel>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (rank, entry) in self.entries.iter().enumerate() {
            if rank > 0 {
                writeln!(f)?;
                writeln!(f)?;
            }
            write!(
                f,
                "{}. {}\n   Confidence: {:.2}%",
                rank + 1,
                entry.label,
                entry.confidence * 100.0
            )?;
        }
        Ok(())
    }
}

/// Full softmax output for one image.
#[derive(Debug, Clone)]
pub struct Distribution {
    probabilities: Vec<f32>,
    labels: Arc<LabelTable>,
}

impl Distribution {
    pub(crate) fn new(probabilities: Vec<f32>, labels: Arc<LabelTable>) -> Self {
        Self {
            probabilities,
            labels,
        }
    }

    pub fn probabilities(&self) -> &[f32] {
        &self.probabilities
    }

    pub fn num_classes(&self) -> usize {
        self.probabilities.len()
    }

    /// The `k` most likely classes.
    ///
    /// `k` may exceed the label table and even the output width: names fall
    /// back to placeholders and indices past the output width are padded with
    /// zero confidence, so exactly `k` distinct entries come back.
    pub fn top_k(&self, k: usize) -> Result<Prediction, PredictionError> {
        if k == 0 {
            return Err(PredictionError::InvalidTopK(k));
        }

        let width = self.probabilities.len();
        let entries = rank_indices(&self.probabilities)
            .into_iter()
            .chain(width..)
            .take(k)
            .map(|class_index| ScoredLabel {
                class_index,
                label: self.labels.name_for(class_index).into_owned(),
                confidence: self.probabilities.get(class_index).copied().unwrap_or(0.0),
            })
            .collect();

        Ok(Prediction::new(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(class_index: usize, label: &str, confidence: f32) -> ScoredLabel {
        ScoredLabel {
            class_index,
            label: label.to_string(),
            confidence,
        }
    }

    #[test]
    fn test_prediction_formatting() {
        let prediction = Prediction::new(vec![
            entry(281, "cat", 0.8543),
            entry(207, "dog", 0.1235),
        ]);
        assert_eq!(
            prediction.to_string(),
            "1. cat\n   Confidence: 85.43%\n\n2. dog\n   Confidence: 12.35%"
        );
    }

    #[test]
    fn test_top_k_pads_past_output_width() {
        let labels = Arc::new(LabelTable::new(vec!["a", "b"]));
        let distribution = Distribution::new(vec![0.2, 0.5, 0.3], labels);

        let prediction = distribution.top_k(5).unwrap();
        let names: Vec<&str> = prediction.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(names, vec!["b", "Class_2", "a", "Class_3", "Class_4"]);
        assert_eq!(prediction.entries()[3].confidence, 0.0);
        assert!((prediction.total_confidence() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_top_k_zero_is_rejected() {
        let distribution = Distribution::new(vec![1.0], Arc::new(LabelTable::imagenet_sample()));
        assert!(matches!(
            distribution.top_k(0),
            Err(PredictionError::InvalidTopK(0))
        ));
    }
}
