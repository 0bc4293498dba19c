use serde::{Deserialize, Serialize};

use super::config::ScoringWeights;
use crate::db::LibraryItem;


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// `None` uses the configured default; zero or negative returns nothing.
    #[serde(default)]
    pub limit: Option<i32>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub filter: Option<String>,
}

impl SearchOptions {
    pub fn with_limit(limit: i32) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        self.filter = Some(expression.into());
        self
    }
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreExplanation {
    pub weights: ScoringWeights,
    pub raw_vector: Option<f64>,
    pub raw_bm25: Option<f64>,
    pub max_bm25: f64,
    pub title_terms: Vec<String>,
    pub concept_terms: Vec<String>,
    pub lexical_terms: Vec<String>,
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub item: LibraryItem,
    pub vector_score: f64,
    pub bm25_score: f64,
    pub title_score: f64,
    pub concept_score: f64,
    pub wordnet_score: f64,
    pub hybrid_score: f64,
    pub matched_concepts: Vec<String>,
    pub expanded_terms_used: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<ScoreExplanation>,
}


/// An item reached by at least one store channel, with that channel's raw score.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub item: LibraryItem,
    pub raw_vector: Option<f64>,
    pub raw_bm25: Option<f64>,
}
