//! Similarity ranking over the in-memory store

use crate::store::Chunk;
use serde::Serialize;
use std::cmp::Ordering;

/// Score given to a pair of vectors that cannot be compared
pub const UNRANKED_SCORE: f32 = -1.0;

/// A chunk paired with its similarity to the query
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub score: f32,
}

/// Dot-product similarity
///
/// Equals cosine similarity when both vectors are unit length. Empty or
/// differently sized vectors score `UNRANKED_SCORE`.
pub fn similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return UNRANKED_SCORE;
    }
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn score_chunk(query: &[f32], chunk: &Chunk) -> Option<f32> {
    let embedding = chunk.embedding.as_deref()?;
    if embedding.is_empty() || embedding.len() != query.len() {
        return None;
    }
    Some(similarity(query, embedding))
}

/// Rank chunks against a query embedding and keep the best `top_k`
///
/// Chunks without a comparable embedding are skipped. The sort is stable,
/// so equal scores keep store order.
pub fn rank(query: &[f32], chunks: &[Chunk], top_k: usize) -> Vec<ScoredChunk> {
    if top_k == 0 || query.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<ScoredChunk> = chunks
        .iter()
        .filter_map(|chunk| {
            score_chunk(query, chunk).map(|score| ScoredChunk {
                chunk: chunk.clone(),
                score,
            })
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);
    scored
}
