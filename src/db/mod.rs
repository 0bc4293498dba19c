

pub mod bm25;
pub mod filter;
pub mod memory;
pub mod models;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::core::ids::ConceptId;
use crate::toolkit::concepts::ConceptNode;

pub use filter::{FilterClause, FilterField, SearchFilter};
pub use memory::{InMemoryConceptStore, InMemoryDocumentStore, StaticThesaurus};
pub use models::{ChannelHit, CollectionKind, LibraryItem};


#[async_trait]
pub trait ConceptStore: Send + Sync {
    /// Replaces nodes with matching ids and adds the rest; readers see the old or the new set, never a mix.
    async fn upsert(&self, nodes: Vec<ConceptNode>) -> Result<()>;

    /// Swaps in exactly these nodes; ids absent from them disappear. Same all-or-nothing visibility as `upsert`.
    async fn replace_all(&self, nodes: Vec<ConceptNode>) -> Result<()>;

    /// Nearest concepts by embedding, best first.
    async fn vector_search(&self, embedding: &[f32], k: usize) -> Result<Vec<(ConceptId, f64)>>;

    async fn get(&self, id: ConceptId) -> Result<Option<ConceptNode>>;
}


#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn kind(&self) -> CollectionKind;

    async fn vector_search(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ChannelHit>>;

    async fn keyword_search(
        &self,
        weighted_terms: &[(String, f64)],
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ChannelHit>>;
}


#[async_trait]
pub trait ThesaurusAdapter: Send + Sync {
    async fn related_terms(&self, term: &str, max_depth: usize, max_results: usize) -> Result<Vec<(String, f64)>>;

    async fn broader_terms(&self, _term: &str, _max_results: usize) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn narrower_terms(&self, _term: &str, _max_results: usize) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

