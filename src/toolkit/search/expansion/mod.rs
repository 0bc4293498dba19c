

pub mod expander;
pub mod models;
pub mod tokenizer;


pub use expander::QueryExpander;
pub use models::ExpandedQuery;
pub use tokenizer::tokenize_query;
