#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Mutex;

use image::{Rgb, RgbImage};
use ndarray::{Array2, Array4};
use snapclass::{Classifier, ImageNetwork, LabelTable, NetworkError};

/// Returns the same raw scores for every input, after checking the input shape.
#[derive(Debug)]
pub struct FixedNetwork {
    pub scores: Vec<f32>,
}

impl FixedNetwork {
    pub fn new(scores: Vec<f32>) -> Self {
        Self { scores }
    }
}

impl ImageNetwork for FixedNetwork {
    fn forward(&self, input: Array4<f32>) -> Result<Array2<f32>, NetworkError> {
        if input.shape() != [1, 3, 224, 224] {
            return Err(NetworkError::Backend(format!("unexpected input shape {:?}", input.shape())));
        }
        Array2::from_shape_vec((1, self.scores.len()), self.scores.clone())
            .map_err(|e| NetworkError::Backend(e.to_string()))
    }

    fn num_classes(&self) -> Option<usize> {
        Some(self.scores.len())
    }
}

/// Blocks each forward pass until the test sends a unit on the gate.
#[derive(Debug)]
pub struct GatedNetwork {
    gate: Mutex<mpsc::Receiver<()>>,
    inner: FixedNetwork,
}

impl GatedNetwork {
    pub fn new(scores: Vec<f32>) -> (Self, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let network = Self {
            gate: Mutex::new(rx),
            inner: FixedNetwork::new(scores),
        };
        (network, tx)
    }
}

impl ImageNetwork for GatedNetwork {
    fn forward(&self, input: Array4<f32>) -> Result<Array2<f32>, NetworkError> {
        let gate = self.gate.lock().map_err(|e| NetworkError::Backend(e.to_string()))?;
        gate.recv().map_err(|e| NetworkError::Backend(e.to_string()))?;
        self.inner.forward(input)
    }
}

/// Always fails inference.
#[derive(Debug)]
pub struct FailingNetwork;

impl ImageNetwork for FailingNetwork {
    fn forward(&self, _input: Array4<f32>) -> Result<Array2<f32>, NetworkError> {
        Err(NetworkError::Backend("device lost".to_string()))
    }
}

pub fn classifier_with(network: impl ImageNetwork + 'static, labels: &[&str]) -> Classifier {
    Classifier::builder()
        .with_network(Box::new(network))
        .unwrap()
        .with_labels(LabelTable::new(labels.to_vec()))
        .build()
        .unwrap()
}

/// Writes a horizontal gradient PNG and returns its path.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let image = RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        Rgb([r, g, 128])
    });
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}
