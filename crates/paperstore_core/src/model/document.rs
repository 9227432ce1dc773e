//! Paper document model.
//!
//! # Responsibility
//! - Define the canonical record stored per paper, with its body paragraphs,
//!   figures/tables and generated summary.
//! - Turn untrusted field data into a typed `Document` or a typed
//!   `DocumentValidationError`.
//!
//! # Invariants
//! - `id` is non-empty and is the only identity of a document.
//! - Declared fields are type-checked strictly; integers are never coerced
//!   from strings or floats.
//! - Unknown fields in input data are ignored.
//! - Sequence fields keep input order.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Public identifier of a document.
pub type DocumentId = String;

/// One paragraph of the paper body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    pub paragraph_id: i64,
    pub section: String,
    pub text: String,
}

/// A figure or a table extracted from the paper.
///
/// Tables reuse this shape; `related` lists the `paragraph_id`s that
/// reference the item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Figure {
    pub idx: i64,
    pub name: String,
    pub caption: String,
    pub related: Vec<i64>,
    pub summary: String,
}

/// Generated summary of a paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub domain: String,
    pub problem: String,
    pub solution: String,
    pub keywords: Vec<String>,
}

/// Canonical paper document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Public identifier. Stored under the reserved primary key `_id`.
    pub id: DocumentId,
    /// Serialized as `abstract`, which is a reserved word in Rust.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub body: Vec<Body>,
    #[serde(default)]
    pub impact: i64,
    pub summary: Summary,
    #[serde(default)]
    pub published_year: Option<String>,
    pub reference: Vec<String>,
    #[serde(default)]
    pub figures: Vec<Figure>,
    #[serde(default)]
    pub tables: Vec<Figure>,
    pub title: String,
}

/// Validation failures for document data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentValidationError {
    /// Data does not match the declared schema.
    ///
    /// `path` points at the failing field (e.g. `body[0].paragraph_id`),
    /// or `<root>` when the mismatch is at the top level.
    Schema { path: String, message: String },
    /// `id` is empty or whitespace only.
    EmptyId,
}

impl Display for DocumentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema { path, message } => {
                write!(f, "document schema mismatch at `{path}`: {message}")
            }
            Self::EmptyId => write!(f, "document id cannot be empty"),
        }
    }
}

impl Error for DocumentValidationError {}

impl Document {
    /// Builds a validated document from a decoded field mapping.
    ///
    /// # Errors
    /// - `Schema` when a required field is missing or has the wrong type.
    /// - `EmptyId` when `id` is blank.
    pub fn from_value(value: Value) -> Result<Self, DocumentValidationError> {
        let document: Self = serde_path_to_error::deserialize(value).map_err(schema_error)?;
        document.validate()?;
        Ok(document)
    }

    /// Parses and validates a document from JSON text.
    ///
    /// Trailing non-whitespace after the JSON object is rejected.
    pub fn from_json(text: &str) -> Result<Self, DocumentValidationError> {
        let mut deserializer = serde_json::Deserializer::from_str(text);
        let document: Self =
            serde_path_to_error::deserialize(&mut deserializer).map_err(schema_error)?;
        deserializer
            .end()
            .map_err(|err| DocumentValidationError::Schema {
                path: "<root>".to_string(),
                message: err.to_string(),
            })?;
        document.validate()?;
        Ok(document)
    }

    /// Checks invariants that the type system does not encode.
    pub fn validate(&self) -> Result<(), DocumentValidationError> {
        if self.id.trim().is_empty() {
            return Err(DocumentValidationError::EmptyId);
        }
        Ok(())
    }
}

fn schema_error(err: serde_path_to_error::Error<serde_json::Error>) -> DocumentValidationError {
    let path = err.path().to_string();
    let source = err.into_inner();
    // `.` is what serde_path_to_error renders for an empty path.
    let path = if path.is_empty() || path == "." {
        "<root>".to_string()
    } else {
        path
    };
    DocumentValidationError::Schema {
        path,
        message: source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, DocumentValidationError};
    use serde_json::json;

    fn minimal() -> serde_json::Value {
        json!({
            "id": "paper-1",
            "abstract": "We study things.",
            "body": [],
            "summary": {
                "domain": "ml",
                "problem": "p",
                "solution": "s",
                "keywords": []
            },
            "reference": [],
            "title": "Things"
        })
    }

    #[test]
    fn defaults_apply_to_optional_fields() {
        let document = Document::from_value(minimal()).unwrap();
        assert_eq!(document.impact, 0);
        assert_eq!(document.published_year, None);
        assert!(document.figures.is_empty());
        assert!(document.tables.is_empty());
    }

    #[test]
    fn blank_id_is_rejected() {
        let mut value = minimal();
        value["id"] = json!("   ");
        let err = Document::from_value(value).unwrap_err();
        assert_eq!(err, DocumentValidationError::EmptyId);
    }

    #[test]
    fn nested_type_error_reports_field_path() {
        let mut value = minimal();
        value["body"] = json!([{ "paragraph_id": "one", "section": "intro", "text": "t" }]);
        let err = Document::from_value(value).unwrap_err();
        match err {
            DocumentValidationError::Schema { path, .. } => {
                assert_eq!(path, "body[0].paragraph_id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn from_json_rejects_trailing_data() {
        let text = format!("{} {{}}", minimal());
        assert!(Document::from_json(&text).is_err());
    }
}
