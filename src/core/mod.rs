

pub mod cache;
pub mod config;
pub mod error;
pub mod ids;
pub mod library;


pub use cache::{IdResolutionCache, ResolutionStats};
pub use config::{CacheConfig, ExpansionConfig, GraphConfig, LibrisConfig, MatcherConfig, VectorizerConfig};
pub use error::{LibrisError, Result};
pub use ids::{ConceptId, concept_id, normalize_concept_name};
pub use library::ConceptLibrary;
