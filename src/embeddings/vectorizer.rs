use std::collections::HashMap;

use crate::core::config::VectorizerConfig;


/// Deterministic text vectorizer.
///
/// Words and (optionally) padded character trigrams are hashed with FNV-1a into a
/// fixed number of buckets, weighted by term frequency, and L2-normalized. All
/// components are non-negative, so cosine similarity between two outputs is in [0, 1].
#[derive(Debug, Clone)]
pub struct HashVectorizer {
    dimensions: usize,
    char_trigrams: bool,
    trigram_weight: f32,
}

impl HashVectorizer {
    pub fn new(config: &VectorizerConfig) -> Self {
        Self {
            dimensions: config.dimensions.max(1),
            char_trigrams: config.char_trigrams,
            trigram_weight: config.trigram_weight,
        }
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self::new(&VectorizerConfig {
            dimensions,
            ..Default::default()
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }


    pub fn embed(&self, text: &str) -> Vec<f32> {
        let words = Self::tokenize(text);
        let mut vector = vec![0.0f32; self.dimensions];
        if words.is_empty() {
            return vector;
        }

        let mut features: HashMap<String, f32> = HashMap::new();
        for word in &words {
            *features.entry(format!("w:{}", word)).or_default() += 1.0;

            if self.char_trigrams {
                let padded: Vec<char> = format!("#{}#", word).chars().collect();
                for window in padded.windows(3) {
                    let gram: String = window.iter().collect();
                    *features.entry(format!("g:{}", gram)).or_default() += self.trigram_weight;
                }
            }
        }

        let total = words.len() as f32;
        for (feature, count) in &features {
            let bucket = Self::bucket(feature, self.dimensions);
            vector[bucket] += count / total;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for value in &mut vector {
                *value /= norm;
            }
        }

        vector
    }

    fn tokenize(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase())
            .collect()
    }

    fn bucket(feature: &str, dimensions: usize) -> usize {
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in feature.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x100000001b3);
        }
        (hash % dimensions as u64) as usize
    }
}

impl Default for HashVectorizer {
    fn default() -> Self {
        Self::new(&VectorizerConfig::default())
    }
}
