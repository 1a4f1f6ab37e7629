use ndarray::ArrayView1;

use super::error::NetworkError;

/// Numerically stable softmax over raw class scores.
pub(crate) fn softmax(scores: ArrayView1<f32>) -> Result<Vec<f32>, NetworkError> {
    if scores.is_empty() {
        return Err(NetworkError::EmptyOutput);
    }
    let max = scores.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
    if !max.is_finite() || scores.iter().any(|x| x.is_nan()) {
        return Err(NetworkError::NonFiniteScores);
    }

    let exps: Vec<f32> = scores.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    Ok(exps.into_iter().map(|x| x / sum).collect())
}

/// Class indices ordered by probability, highest first. The sort is stable,
/// so equal probabilities keep ascending index order.
pub(crate) fn rank_indices(probabilities: &[f32]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..probabilities.len()).collect();
    indices.sort_by(|&a, &b| probabilities[b].total_cmp(&probabilities[a]));
    indices
}
