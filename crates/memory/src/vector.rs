//! Vector similarity search over stored chunk embeddings.

use neura_core::{EmbeddingRecord, MatchQuery, RetrievedMatch};

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 for empty, zero-norm or mismatched-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank one document's records against a query embedding.
///
/// Keeps rows with `similarity >= similarity_threshold`, sorted by
/// descending similarity (ties by `chunk_index`), at most `match_count`.
pub fn match_records(records: &[EmbeddingRecord], query: &MatchQuery) -> Vec<RetrievedMatch> {
    let mut scored: Vec<RetrievedMatch> = records
        .iter()
        .filter(|r| r.document_id == query.document_id)
        .filter_map(|r| {
            let sim = cosine_similarity(&r.embedding, &query.embedding);
            (sim.is_finite() && sim >= query.similarity_threshold)
                .then(|| RetrievedMatch::new(r.id, r.chunk_index, r.chunk_text.clone(), sim))
        })
        .collect();

    scored.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then(a.chunk_index.cmp(&b.chunk_index))
    });
    scored.truncate(query.match_count);
    scored
}
