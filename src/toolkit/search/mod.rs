

pub mod expansion;
pub mod hybrid;


pub use expansion::{ExpandedQuery, QueryExpander, tokenize_query};
pub use hybrid::{HybridSearchEngine, ScoreExplanation, ScoredResult, ScoringConfig, ScoringWeights, SearchOptions};
