//! Vector operations for embeddings.

use crate::{Error, Result};

pub type Vector = Vec<f32>;

pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::validation(format!(
            "Vector dimensions must match: {} != {}",
            a.len(),
            b.len()
        )));
    }
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale to unit L2 norm. A zero vector is returned unchanged.
pub fn normalize_vector(v: &[f32]) -> Vector {
    let mag = magnitude(v);
    if mag == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / mag).collect()
}

/// Cosine similarity for vectors of any norm.
///
/// Stored embeddings are already unit length, where this equals
/// [`dot_product`]; this form is for callers holding raw model output.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    let dot = dot_product(a, b)?;
    let mag_a = magnitude(a);
    let mag_b = magnitude(b);
    if mag_a == 0.0 || mag_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (mag_a * mag_b))
}

/// Elementwise mean of equally sized vectors.
pub fn average_vectors(vectors: &[Vec<f32>]) -> Result<Vector> {
    if vectors.is_empty() {
        return Err(Error::validation("Cannot average empty list"));
    }
    let dim = vectors[0].len();
    if !vectors.iter().all(|v| v.len() == dim) {
        return Err(Error::validation("All vectors must have same dimensions"));
    }
    let n = vectors.len() as f32;
    let mut result = vec![0.0; dim];
    for v in vectors {
        for (acc, val) in result.iter_mut().zip(v.iter()) {
            *acc += val;
        }
    }
    for val in &mut result {
        *val /= n;
    }
    Ok(result)
}
