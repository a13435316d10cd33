use serde::{Deserialize, Serialize};

/// A fixed-length image feature vector
///
/// Embeddings leaving the backend are L2-normalized, except the all-zero
/// placeholder stored for products whose embedding could not be computed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Embedding {
    data: Vec<f32>,
}

impl Embedding {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Wrap raw features and L2-normalize them
    #[inline]
    #[must_use]
    pub fn normalized_from(data: Vec<f32>) -> Self {
        Self {
            data: normalize(data),
        }
    }

    /// All-zero placeholder of the given dimension
    #[inline]
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self {
            data: vec![0.0; dim],
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// True for the zero vector (and the empty vector)
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.data.iter().all(|x| *x == 0.0)
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        norm(&self.data)
    }
}

#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
pub fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Euclidean distance; callers check lengths first
#[inline]
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// Scale a vector to unit Euclidean length
///
/// A zero-norm vector comes back unchanged so no NaN can leak into scores.
#[must_use]
pub fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = norm(&vector);
    if norm > 0.0 && norm.is_finite() {
        let inv_norm = 1.0 / norm;
        for x in &mut vector {
            *x *= inv_norm;
        }
    }
    vector
}
