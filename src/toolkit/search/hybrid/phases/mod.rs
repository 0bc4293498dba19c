

pub mod concepts;
pub mod keyword;
pub mod ranking;
pub mod title;
pub mod vector;

pub use concepts::{ConceptOverlap, score_concept_overlap, term_matches_concept};
pub use keyword::keyword_search_phase;
pub use ranking::{apply_limit, combine_scores, merge_candidates, resolve_limit, sort_results};
pub use title::title_match_score;
pub use vector::vector_search_phase;

use crate::core::error::LibrisError;


pub(crate) fn as_store_error(error: LibrisError) -> LibrisError {
    match error {
        LibrisError::StoreUnavailable(_) => error,
        other => LibrisError::store(other.to_string()),
    }
}
