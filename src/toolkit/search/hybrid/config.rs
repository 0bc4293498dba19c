use serde::{Deserialize, Serialize};

use crate::core::error::{LibrisError, Result};
use crate::db::CollectionKind;


#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(default = "default_vector_weight")]
    pub vector: f64,
    #[serde(default = "default_bm25_weight")]
    pub bm25: f64,
    #[serde(default = "default_concept_weight")]
    pub concept: f64,
    #[serde(default = "default_title_weight")]
    pub title: f64,
    #[serde(default = "default_wordnet_weight")]
    pub wordnet: f64,
}

fn default_vector_weight() -> f64 { 0.35 }
fn default_bm25_weight() -> f64 { 0.25 }
fn default_concept_weight() -> f64 { 0.20 }
fn default_title_weight() -> f64 { 0.10 }
fn default_wordnet_weight() -> f64 { 0.10 }

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            vector: default_vector_weight(),
            bm25: default_bm25_weight(),
            concept: default_concept_weight(),
            title: default_title_weight(),
            wordnet: default_wordnet_weight(),
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.vector + self.bm25 + self.concept + self.title + self.wordnet
    }

    pub fn validate(&self) -> Result<()> {
        let all = [
            ("vector", self.vector),
            ("bm25", self.bm25),
            ("concept", self.concept),
            ("title", self.title),
            ("wordnet", self.wordnet),
        ];
        for (name, value) in all {
            if !value.is_finite() || value < 0.0 {
                return Err(LibrisError::Config(format!(
                    "scoring.weights.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if self.sum() <= 0.0 {
            return Err(LibrisError::Config("scoring weights must not all be zero".into()));
        }
        Ok(())
    }


    /// Untitled collections hand the title weight to vector and bm25 in proportion to theirs.
    pub fn for_collection(&self, kind: CollectionKind) -> Self {
        if kind.has_titles() || self.title == 0.0 {
            return *self;
        }

        let mut weights = *self;
        let base = self.vector + self.bm25;
        if base > 0.0 {
            weights.vector += self.title * self.vector / base;
            weights.bm25 += self.title * self.bm25 / base;
        }
        weights.title = 0.0;
        weights
    }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: ScoringWeights,

    #[serde(default = "default_vector_top_k")]
    pub vector_top_k: usize,

    #[serde(default = "default_keyword_top_k")]
    pub keyword_top_k: usize,

    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

fn default_vector_top_k() -> usize { 50 }
fn default_keyword_top_k() -> usize { 50 }
fn default_limit() -> usize { crate::DEFAULT_SEARCH_LIMIT }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            vector_top_k: default_vector_top_k(),
            keyword_top_k: default_keyword_top_k(),
            default_limit: default_limit(),
        }
    }
}
