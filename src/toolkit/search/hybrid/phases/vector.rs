use tracing::info;

use super::as_store_error;
use crate::core::error::Result;
use crate::db::{ChannelHit, DocumentStore, SearchFilter};


pub async fn vector_search_phase(
    store: &dyn DocumentStore,
    query_embedding: &[f32],
    top_k: usize,
    filter: Option<&SearchFilter>,
) -> Result<Vec<ChannelHit>> {
    if query_embedding.iter().all(|x| *x == 0.0) {
        return Ok(Vec::new());
    }

    let hits = store
        .vector_search(query_embedding, top_k, filter)
        .await
        .map_err(as_store_error)?;

    info!("Vector search: {} results", hits.len());
    Ok(hits)
}
