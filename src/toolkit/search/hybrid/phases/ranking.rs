use std::collections::HashMap;

use crate::db::ChannelHit;
use crate::toolkit::search::hybrid::config::ScoringWeights;
use crate::toolkit::search::hybrid::models::{Candidate, ScoredResult};


/// Union of both channels by item id; an item missing from a channel has no raw score there.
pub fn merge_candidates(vector_hits: Vec<ChannelHit>, keyword_hits: Vec<ChannelHit>) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for hit in vector_hits {
        if index.contains_key(&hit.item.id) {
            continue;
        }
        index.insert(hit.item.id.clone(), candidates.len());
        candidates.push(Candidate {
            item: hit.item,
            raw_vector: Some(hit.score),
            raw_bm25: None,
        });
    }

    for hit in keyword_hits {
        match index.get(&hit.item.id) {
            Some(&i) => {
                if candidates[i].raw_bm25.is_none() {
                    candidates[i].raw_bm25 = Some(hit.score);
                }
            }
            None => {
                index.insert(hit.item.id.clone(), candidates.len());
                candidates.push(Candidate {
                    item: hit.item,
                    raw_vector: None,
                    raw_bm25: Some(hit.score),
                });
            }
        }
    }

    candidates
}


pub fn combine_scores(weights: &ScoringWeights, vector: f64, bm25: f64, concept: f64, title: f64, wordnet: f64) -> f64 {
    let total = weights.sum();
    if total <= 0.0 {
        return 0.0;
    }
    let weighted = weights.vector * vector
        + weights.bm25 * bm25
        + weights.concept * concept
        + weights.title * title
        + weights.wordnet * wordnet;
    (weighted / total).clamp(0.0, 1.0)
}


pub fn sort_results(results: &mut [ScoredResult]) {
    results.sort_by(|a, b| {
        b.hybrid_score
            .total_cmp(&a.hybrid_score)
            .then_with(|| b.vector_score.total_cmp(&a.vector_score))
            .then_with(|| a.item.id.cmp(&b.item.id))
    });
}


/// `Some(n <= 0)` yields nothing; `None` falls back to `default_limit`.
pub fn resolve_limit(limit: Option<i32>, default_limit: usize) -> usize {
    match limit {
        Some(n) if n <= 0 => 0,
        Some(n) => n as usize,
        None => default_limit,
    }
}

pub fn apply_limit(mut results: Vec<ScoredResult>, limit: usize) -> Vec<ScoredResult> {
    results.truncate(limit);
    results
}
