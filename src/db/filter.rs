use serde::{Deserialize, Serialize};

use super::models::LibraryItem;
use crate::core::error::{LibrisError, Result};


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterField {
    IsReference,
    DocumentId,
    Category,
    Title,
    Meta(String),
}


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterClause {
    pub field: FilterField,
    pub negated: bool,
    pub value: String,
}

impl FilterClause {
    fn matches(&self, item: &LibraryItem) -> bool {
        let hit = match &self.field {
            FilterField::IsReference => item.is_reference.to_string() == self.value,
            FilterField::DocumentId => item.document_id == self.value,
            FilterField::Category => item.categories.iter().any(|c| c.eq_ignore_ascii_case(&self.value)),
            FilterField::Title => item.title.as_deref() == Some(self.value.as_str()),
            FilterField::Meta(key) => item.metadata.get(key).map(String::as_str) == Some(self.value.as_str()),
        };
        hit != self.negated
    }
}


/// Conjunction of equality clauses, e.g. `is_reference = false AND category = 'software'`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub clauses: Vec<FilterClause>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
    Eq,
    Ne,
}

impl SearchFilter {
    pub fn exclude_references() -> Self {
        Self {
            clauses: vec![FilterClause {
                field: FilterField::IsReference,
                negated: false,
                value: "false".to_string(),
            }],
        }
    }

    pub fn matches(&self, item: &LibraryItem) -> bool {
        self.clauses.iter().all(|c| c.matches(item))
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }


    pub fn parse(expression: &str) -> Result<Self> {
        let tokens = tokenize(expression)?;
        let mut clauses = Vec::new();
        let mut iter = tokens.into_iter().peekable();

        while iter.peek().is_some() {
            if !clauses.is_empty() {
                match iter.next() {
                    Some(Token::Word(w)) if w.eq_ignore_ascii_case("and") => {}
                    other => {
                        return Err(LibrisError::InvalidFilter(format!("expected AND, found {:?}", other)));
                    }
                }
            }

            let field = match iter.next() {
                Some(Token::Word(w)) => parse_field(&w)?,
                other => return Err(LibrisError::InvalidFilter(format!("expected field name, found {:?}", other))),
            };
            let negated = match iter.next() {
                Some(Token::Eq) => false,
                Some(Token::Ne) => true,
                other => return Err(LibrisError::InvalidFilter(format!("expected = or !=, found {:?}", other))),
            };
            let value = match iter.next() {
                Some(Token::Word(w)) | Some(Token::Quoted(w)) => w,
                other => return Err(LibrisError::InvalidFilter(format!("expected value, found {:?}", other))),
            };

            let value = if field == FilterField::IsReference {
                match value.to_lowercase().as_str() {
                    "true" | "false" => value.to_lowercase(),
                    _ => {
                        return Err(LibrisError::InvalidFilter(format!(
                            "is_reference expects true or false, got '{}'",
                            value
                        )));
                    }
                }
            } else {
                value
            };

            clauses.push(FilterClause { field, negated, value });
        }

        Ok(Self { clauses })
    }
}

fn parse_field(name: &str) -> Result<FilterField> {
    match name {
        "is_reference" => Ok(FilterField::IsReference),
        "document_id" => Ok(FilterField::DocumentId),
        "category" => Ok(FilterField::Category),
        "title" => Ok(FilterField::Title),
        other => match other.strip_prefix("meta.") {
            Some(key) if !key.is_empty() => Ok(FilterField::Meta(key.to_string())),
            _ => Err(LibrisError::InvalidFilter(format!("unknown field '{}'", other))),
        },
    }
}

fn tokenize(expression: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '\'' || c == '"' {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == c {
                    closed = true;
                    break;
                }
                value.push(ch);
            }
            if !closed {
                return Err(LibrisError::InvalidFilter("unterminated quoted value".into()));
            }
            tokens.push(Token::Quoted(value));
        } else if c == '=' {
            chars.next();
            tokens.push(Token::Eq);
        } else if c == '!' {
            chars.next();
            if chars.next() != Some('=') {
                return Err(LibrisError::InvalidFilter("expected '=' after '!'".into()));
            }
            tokens.push(Token::Ne);
        } else {
            let mut word = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() || ch == '=' || ch == '!' || ch == '\'' || ch == '"' {
                    break;
                }
                word.push(ch);
                chars.next();
            }
            tokens.push(Token::Word(word));
        }
    }

    Ok(tokens)
}
