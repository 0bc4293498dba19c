use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::core::error::{LibrisError, Result};
use crate::core::ids::ConceptId;


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptNode {
    pub id: ConceptId,
    pub name: String,
    pub embedding: Vec<f32>,
    pub weight: u32,
    pub catalog_ids: BTreeSet<String>,
    pub related_concept_ids: Vec<ConceptId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub broader_terms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub narrower_terms: Vec<String>,
}


/// Validated concept metadata of one processed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentConcepts {
    pub document_id: String,
    pub concepts: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl DocumentConcepts {
    pub fn new(document_id: impl Into<String>, concepts: &[&str]) -> Self {
        Self {
            document_id: document_id.into(),
            concepts: concepts.iter().map(|c| (*c).to_string()).collect(),
            categories: Vec::new(),
        }
    }

    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|c| (*c).to_string()).collect();
        self
    }


    /// Boundary validation for upstream JSON. Numeric document ids are accepted as strings;
    /// non-string concept entries are dropped.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| LibrisError::validation("concept metadata is not an object"))?;

        let document_id = match obj.get("document_id").or_else(|| obj.get("catalog_id")) {
            Some(serde_json::Value::String(s)) => s.trim().to_string(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => return Err(LibrisError::validation("missing document_id")),
        };
        if document_id.is_empty() {
            return Err(LibrisError::validation("empty document_id"));
        }

        let concepts = obj
            .get("concepts")
            .and_then(|v| v.as_array())
            .ok_or_else(|| LibrisError::validation(format!("document {} has no concepts array", document_id)))?
            .iter()
            .filter_map(|c| c.as_str().map(str::to_string))
            .collect();

        let categories = obj
            .get("categories")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|c| c.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        Ok(Self {
            document_id,
            concepts,
            categories,
        })
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchKind {
    Exact,
    AllWords,
    WordBoundary,
    Fuzzy,
}

impl MatchKind {
    pub fn confidence(&self) -> f64 {
        match self {
            Self::Exact => 1.0,
            Self::AllWords => 0.85,
            Self::WordBoundary => 0.8,
            Self::Fuzzy => 0.6,
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptMatch {
    pub name: String,
    pub kind: MatchKind,
    pub confidence: f64,
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkConceptAttribution {
    pub matched_concept_names: Vec<String>,
    pub matched_categories: Vec<String>,
    pub density: f64,
    pub matches: Vec<ConceptMatch>,
    pub matched_related_terms: Vec<String>,
}

impl ChunkConceptAttribution {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.matched_concept_names.is_empty()
    }
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub documents_processed: usize,
    pub documents_skipped: usize,
    pub total_concepts: usize,
    pub cooccurring_pairs: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_accepts_numeric_id() {
        let doc = DocumentConcepts::from_value(&json!({
            "document_id": 42,
            "concepts": ["Clean Architecture", 7, "rest api"],
            "categories": ["software"]
        }))
        .unwrap();
        assert_eq!(doc.document_id, "42");
        assert_eq!(doc.concepts, vec!["Clean Architecture", "rest api"]);
        assert_eq!(doc.categories, vec!["software"]);
    }

    #[test]
    fn test_from_value_rejects_malformed() {
        assert!(DocumentConcepts::from_value(&json!("not an object")).is_err());
        assert!(DocumentConcepts::from_value(&json!({"concepts": ["a"]})).is_err());
        assert!(DocumentConcepts::from_value(&json!({"document_id": "  ", "concepts": []})).is_err());
        assert!(DocumentConcepts::from_value(&json!({"document_id": "d1", "concepts": "x"})).is_err());
    }

    #[test]
    fn test_match_kind_strings() {
        let kind: &'static str = MatchKind::WordBoundary.into();
        assert_eq!(kind, "word_boundary");
        assert_eq!("all_words".parse::<MatchKind>().unwrap(), MatchKind::AllWords);
    }
}
