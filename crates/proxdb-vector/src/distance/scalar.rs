//! Scalar distance kernels over `f64` slices.
//!
//! Callers are responsible for dimension checks; these kernels only
//! debug-assert equal lengths.

/// Calculate the squared Euclidean (L2) distance between two vectors.
///
/// This avoids the sqrt operation for cases where only relative distances matter.
#[inline]
#[must_use]
pub fn euclidean_distance_squared(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same dimension");
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Calculate the Euclidean (L2) distance between two vectors.
#[inline]
#[must_use]
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    euclidean_distance_squared(a, b).sqrt()
}

/// Calculate the Manhattan (L1) distance between two vectors.
#[inline]
#[must_use]
pub fn manhattan_distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same dimension");
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

/// Calculate the Chebyshev (L∞) distance between two vectors.
#[inline]
#[must_use]
pub fn chebyshev_distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same dimension");
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
}

/// Calculate the dot product between two vectors.
#[inline]
#[must_use]
pub fn dot_product(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same dimension");
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Calculate the L2 norm (magnitude) of a vector.
#[inline]
#[must_use]
pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Calculate the cosine similarity between two vectors.
///
/// Returns a value in the range [-1, 1]. Returns 0.0 if either vector has
/// zero magnitude.
#[inline]
#[must_use]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot_product(a, b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Calculate the cosine distance between two vectors.
///
/// Cosine distance = 1 - cosine_similarity.
#[inline]
#[must_use]
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    1.0 - cosine_similarity(a, b)
}
