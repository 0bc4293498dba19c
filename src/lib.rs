

pub mod core;
pub mod db;
pub mod embeddings;
pub mod toolkit;
pub mod utils;

pub use utils::log_snippet;


pub use crate::core::config::LibrisConfig;
pub use crate::core::error::{LibrisError, Result};
pub use crate::core::library::ConceptLibrary;
pub use db::{ConceptStore, DocumentStore, LibraryItem, SearchFilter, ThesaurusAdapter};
pub use embeddings::HashVectorizer;
pub use toolkit::concepts::{ChunkConceptAttribution, ConceptNode, DocumentConcepts, attribute_concepts, build_concept_graph};
pub use toolkit::search::{ExpandedQuery, ScoredResult, SearchOptions};


pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;


pub const DEFAULT_CACHE_SIZE: usize = 1000;


pub const DEFAULT_SEARCH_LIMIT: usize = 10;
