//! Mapping between the public document shape and stored field maps.
//!
//! # Responsibility
//! - Own the only `id` <-> `_id` rename used by read and write paths.
//!
//! # Invariants
//! - `from_storage_fields(to_storage_fields(doc)?)? == doc` for every valid
//!   document.
//! - Stored field maps always carry `_id` and never carry `id`.

use crate::model::document::Document;
use crate::repo::document_repo::{RepoError, RepoResult};
use serde_json::{Map, Value};

/// Public identifier field of the document schema.
pub const PUBLIC_ID_FIELD: &str = "id";
/// Reserved primary-key field of stored records.
pub const PRIMARY_KEY_FIELD: &str = "_id";

/// Top-level field map of a stored record.
pub type FieldMap = Map<String, Value>;

/// Serializes a document into a storage field map keyed by `_id`.
pub fn to_storage_fields(document: &Document) -> RepoResult<FieldMap> {
    let mut fields = match serde_json::to_value(document) {
        Ok(Value::Object(fields)) => fields,
        Ok(other) => {
            return Err(RepoError::InvalidData(format!(
                "document serialized to non-object value `{other}`"
            )));
        }
        Err(err) => {
            return Err(RepoError::InvalidData(format!(
                "document serialization failed: {err}"
            )));
        }
    };
    rename_field(&mut fields, PUBLIC_ID_FIELD, PRIMARY_KEY_FIELD);
    Ok(fields)
}

/// Rebuilds and validates a document from a stored field map.
///
/// # Errors
/// - `InvalidData` when the map has no `_id`.
/// - `Validation` when the remaining fields do not satisfy the schema.
pub fn from_storage_fields(mut fields: FieldMap) -> RepoResult<Document> {
    if !rename_field(&mut fields, PRIMARY_KEY_FIELD, PUBLIC_ID_FIELD) {
        return Err(RepoError::InvalidData(format!(
            "stored record is missing `{PRIMARY_KEY_FIELD}`"
        )));
    }
    Ok(Document::from_value(Value::Object(fields))?)
}

/// Moves the value under `from` to `to`. Returns whether `from` existed.
fn rename_field(fields: &mut FieldMap, from: &str, to: &str) -> bool {
    match fields.remove(from) {
        Some(value) => {
            fields.insert(to.to_string(), value);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{from_storage_fields, to_storage_fields, FieldMap, PRIMARY_KEY_FIELD};
    use crate::model::document::{Body, Document, Figure, Summary};
    use crate::repo::document_repo::RepoError;
    use serde_json::{json, Value};

    fn sample() -> Document {
        Document {
            id: "arxiv:2401.00001".to_string(),
            abstract_text: "An abstract.".to_string(),
            body: vec![
                Body {
                    paragraph_id: 0,
                    section: "Introduction".to_string(),
                    text: "First.".to_string(),
                },
                Body {
                    paragraph_id: 1,
                    section: "Method".to_string(),
                    text: "Second.".to_string(),
                },
            ],
            impact: 7,
            summary: Summary {
                domain: "vision".to_string(),
                problem: "blur".to_string(),
                solution: "deblur".to_string(),
                keywords: vec!["deblurring".to_string(), "cnn".to_string()],
            },
            published_year: Some("2024".to_string()),
            reference: vec!["ref-a".to_string()],
            figures: vec![Figure {
                idx: 1,
                name: "Figure 1".to_string(),
                caption: "Overview".to_string(),
                related: vec![0, 1],
                summary: "pipeline".to_string(),
            }],
            tables: Vec::new(),
            title: "Deblurring".to_string(),
        }
    }

    #[test]
    fn write_path_moves_id_to_primary_key() {
        let fields = to_storage_fields(&sample()).unwrap();
        assert_eq!(fields.get(PRIMARY_KEY_FIELD), Some(&json!("arxiv:2401.00001")));
        assert!(!fields.contains_key("id"));
        assert_eq!(fields.get("abstract"), Some(&json!("An abstract.")));
        assert_eq!(fields.get("published_year"), Some(&json!("2024")));
    }

    #[test]
    fn mapping_round_trips() {
        let document = sample();
        let restored = from_storage_fields(to_storage_fields(&document).unwrap()).unwrap();
        assert_eq!(restored, document);

        let mut without_year = sample();
        without_year.published_year = None;
        let fields = to_storage_fields(&without_year).unwrap();
        assert_eq!(fields.get("published_year"), Some(&Value::Null));
        assert_eq!(from_storage_fields(fields).unwrap(), without_year);
    }

    #[test]
    fn read_path_requires_primary_key() {
        let mut fields = to_storage_fields(&sample()).unwrap();
        fields.remove(PRIMARY_KEY_FIELD);
        let err = from_storage_fields(fields).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
    }

    #[test]
    fn read_path_ignores_unknown_fields() {
        let mut fields: FieldMap = to_storage_fields(&sample()).unwrap();
        fields.insert("legacy_score".to_string(), json!(3.5));
        assert_eq!(from_storage_fields(fields).unwrap(), sample());
    }
}
