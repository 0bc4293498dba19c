

pub mod config;
pub mod models;
pub mod phases;


pub use config::{ScoringConfig, ScoringWeights};
pub use models::{ScoreExplanation, ScoredResult, SearchOptions};

use std::sync::Arc;

use tracing::{debug, info};

use crate::core::error::Result;
use crate::db::{DocumentStore, SearchFilter};
use crate::embeddings::HashVectorizer;
use crate::toolkit::search::expansion::QueryExpander;
use phases::{
    apply_limit, combine_scores, keyword_search_phase, merge_candidates, resolve_limit, score_concept_overlap,
    sort_results, title_match_score, vector_search_phase,
};


/// Fuses vector, keyword, title, concept and thesaurus signals over one document collection.
pub struct HybridSearchEngine {
    document_store: Arc<dyn DocumentStore>,
    expander: Arc<QueryExpander>,
    vectorizer: Arc<HashVectorizer>,
    config: ScoringConfig,
}

impl HybridSearchEngine {
    pub fn new(
        document_store: Arc<dyn DocumentStore>,
        expander: Arc<QueryExpander>,
        vectorizer: Arc<HashVectorizer>,
        config: ScoringConfig,
    ) -> Self {
        Self {
            document_store,
            expander,
            vectorizer,
            config,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }


    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<ScoredResult>> {
        let filter = match options.filter.as_deref() {
            Some(expression) => Some(SearchFilter::parse(expression)?).filter(|f| !f.is_empty()),
            None => None,
        };

        let limit = resolve_limit(options.limit, self.config.default_limit);
        if limit == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let store = self.document_store.as_ref();
        let embedding = self.vectorizer.embed(query);
        let vector_k = self.config.vector_top_k.max(limit);

        let (expanded, vector_hits) = tokio::join!(
            self.expander.expand(query),
            vector_search_phase(store, &embedding, vector_k, filter.as_ref())
        );
        let vector_hits = vector_hits?;

        let weighted_terms = expanded.weighted_terms();
        let keyword_k = self.config.keyword_top_k.max(limit);
        let keyword_hits = keyword_search_phase(store, &weighted_terms, keyword_k, filter.as_ref()).await?;

        let candidates = merge_candidates(vector_hits, keyword_hits);
        let max_bm25 = candidates
            .iter()
            .filter_map(|c| c.raw_bm25)
            .fold(0.0f64, f64::max);
        let weights = self.config.weights.for_collection(store.kind());
        let titled = store.kind().has_titles();

        let mut results: Vec<ScoredResult> = candidates
            .into_iter()
            .map(|candidate| {
                let vector_score = candidate.raw_vector.unwrap_or(0.0).clamp(0.0, 1.0);
                let bm25_score = match candidate.raw_bm25 {
                    Some(raw) if max_bm25 > 0.0 => (raw / max_bm25).clamp(0.0, 1.0),
                    _ => 0.0,
                };
                let (title_score, title_terms) = if titled {
                    title_match_score(candidate.item.title.as_deref(), &expanded)
                } else {
                    (0.0, Vec::new())
                };
                let overlap = score_concept_overlap(&expanded, &candidate.item.concepts);

                let hybrid_score = combine_scores(
                    &weights,
                    vector_score,
                    bm25_score,
                    overlap.concept_score,
                    title_score,
                    overlap.wordnet_score,
                );

                let mut expanded_terms_used: Vec<String> = Vec::new();
                for term in title_terms.iter().chain(&overlap.concept_terms).chain(&overlap.lexical_terms) {
                    if !expanded.is_original(term) && !expanded_terms_used.contains(term) {
                        expanded_terms_used.push(term.clone());
                    }
                }

                let explanation = options.debug.then(|| ScoreExplanation {
                    weights,
                    raw_vector: candidate.raw_vector,
                    raw_bm25: candidate.raw_bm25,
                    max_bm25,
                    title_terms,
                    concept_terms: overlap.concept_terms.clone(),
                    lexical_terms: overlap.lexical_terms.clone(),
                });

                ScoredResult {
                    item: candidate.item,
                    vector_score,
                    bm25_score,
                    title_score,
                    concept_score: overlap.concept_score,
                    wordnet_score: overlap.wordnet_score,
                    hybrid_score,
                    matched_concepts: overlap.matched_concepts,
                    expanded_terms_used,
                    explanation,
                }
            })
            .collect();

        sort_results(&mut results);
        debug!("Scored {} candidates", results.len());

        let results = apply_limit(results, limit);
        info!(
            "Hybrid search '{}': {} results",
            crate::log_snippet(query, 60),
            results.len()
        );
        Ok(results)
    }
}
