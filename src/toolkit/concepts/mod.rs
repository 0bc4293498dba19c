

pub mod enrichment;
pub mod graph;
pub mod matcher;
pub mod models;


pub use enrichment::{EnrichmentStats, enrich_graph};
pub use graph::{
    CancellationFlag, ConceptGraph, ConceptGraphBuilder, CooccurrenceTable, GraphAccumulator, build_concept_graph,
};
pub use matcher::{ConceptMatcher, attribute_concepts};
pub use models::{
    ChunkConceptAttribution, ConceptMatch, ConceptNode, DocumentConcepts, GraphStats, MatchKind,
};
