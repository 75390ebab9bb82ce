//! Relevance scoring.

use ragdoc_core::DistanceMetric;

/// Relevance of `candidate` to `query` under `metric`. Higher is more relevant.
///
/// - `Cosine`: cosine similarity in `[-1, 1]`; 0 when either vector is zero.
/// - `L2`: `1 - d / sqrt(2)` with `d` the squared euclidean distance, which
///   lands in `[0, 1]` for unit vectors that are no more than 90° apart.
/// - `Dot`: the raw inner product.
///
/// Vectors of different lengths score 0.
#[must_use]
pub fn relevance(metric: DistanceMetric, query: &[f32], candidate: &[f32]) -> f32 {
    if query.len() != candidate.len() {
        return 0.0;
    }

    match metric {
        DistanceMetric::Cosine => cosine_similarity(query, candidate),
        DistanceMetric::L2 => 1.0 - squared_l2(query, candidate) / std::f32::consts::SQRT_2,
        DistanceMetric::Dot => dot(query, candidate),
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = dot(a, a).sqrt();
    let norm_b = dot(b, b).sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot(a, b) / (norm_a * norm_b)
}
