//! Blended cosine/euclidean similarity metric
//!
//! All scores land in [0.0, 1.0] where 1.0 means identical.

use crate::embedding::{dot, l2_distance, norm, Embedding};
use crate::{Error, Result};

/// Weight of the remapped cosine term in the final score
pub const COSINE_WEIGHT: f32 = 0.85;

/// Weight of the inverse-distance term in the final score
pub const EUCLIDEAN_WEIGHT: f32 = 0.15;

/// Cosine similarity in [-1, 1]; 0 when either vector has zero magnitude
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dims(a, b)?;

    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot(a, b) / (norm_a * norm_b))
}

/// Similarity score between two vectors
///
/// `0.85 * (cos + 1) / 2 + 0.15 * 1 / (1 + d)`, clamped to [0, 1].
pub fn similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    let cos = cosine_similarity(a, b)?;
    let cosine_component = (cos + 1.0) / 2.0;
    let euclidean_component = 1.0 / (1.0 + l2_distance(a, b));

    let score = COSINE_WEIGHT * cosine_component + EUCLIDEAN_WEIGHT * euclidean_component;
    if score.is_nan() {
        return Ok(0.0);
    }
    Ok(score.clamp(0.0, 1.0))
}

/// Similarity between two embeddings
pub fn embedding_similarity(a: &Embedding, b: &Embedding) -> Result<f32> {
    similarity(a.as_slice(), b.as_slice())
}

#[inline]
fn check_dims(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::normalize;

    fn unit(v: Vec<f32>) -> Vec<f32> {
        normalize(v)
    }

    #[test]
    fn test_self_similarity_is_one() {
        let a = unit(vec![0.2, -0.7, 0.1, 0.9]);
        let s = similarity(&a, &a).unwrap();
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_opposite_vectors() {
        let a = unit(vec![1.0, 0.0]);
        let b = unit(vec![-1.0, 0.0]);
        // cos = -1 -> 0.0, d = 2 -> 1/3
        let expected = EUCLIDEAN_WEIGHT / 3.0;
        assert!((similarity(&a, &b).unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let d = 2.0f32.sqrt();
        let expected = 0.85 * 0.5 + 0.15 / (1.0 + d);
        assert!((similarity(&a, &b).unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_bounds_over_many_pairs() {
        let mut seed = 17u32;
        let mut next = || {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            ((seed >> 8) as f32 / (1u32 << 24) as f32) * 2.0 - 1.0
        };
        for _ in 0..200 {
            let a = unit((0..16).map(|_| next()).collect());
            let b = unit((0..16).map(|_| next()).collect());
            let s = similarity(&a, &b).unwrap();
            assert!((0.0..=1.0).contains(&s), "score {} out of range", s);
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0]).unwrap_err();
        match err {
            Error::DimensionMismatch { expected, actual } => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_vector_cosine_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), 0.0);
        // cos component 0.5, distance 1 -> 0.5
        let s = similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap();
        assert!((s - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_higher_cosine_scores_higher() {
        let q = vec![1.0, 0.0];
        let near = unit(vec![0.9, 0.1]);
        let far = unit(vec![0.1, 0.9]);
        assert!(similarity(&q, &near).unwrap() > similarity(&q, &far).unwrap());
    }
}
