use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CollectionKind {
    /// One item per document, titled.
    #[default]
    Catalog,
    Chunks,
}

impl CollectionKind {
    pub fn has_titles(&self) -> bool {
        matches!(self, Self::Catalog)
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryItem {
    pub id: String,
    pub document_id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub text: String,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub is_reference: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl LibraryItem {
    pub fn new(id: impl Into<String>, document_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            document_id: document_id.into(),
            title: None,
            text: text.into(),
            concepts: Vec::new(),
            categories: Vec::new(),
            is_reference: false,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_concepts<S: AsRef<str>>(mut self, concepts: &[S]) -> Self {
        self.concepts = concepts.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    pub fn with_categories<S: AsRef<str>>(mut self, categories: &[S]) -> Self {
        self.categories = categories.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    pub fn reference(mut self) -> Self {
        self.is_reference = true;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}


/// One item returned by a store channel with that channel's raw score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelHit {
    pub item: LibraryItem,
    pub score: f64,
}
