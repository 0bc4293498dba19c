pub mod similarity;
pub mod vectorizer;

pub use similarity::{char_jaccard, cosine_similarity};
pub use vectorizer::HashVectorizer;
