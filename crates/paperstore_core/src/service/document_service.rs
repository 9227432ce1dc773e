//! Document use-case service.
//!
//! # Responsibility
//! - Provide lookup, upsert and JSON import entry points for core callers.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Imported JSON is fully validated before the repository is touched.

use crate::model::document::Document;
use crate::repo::document_repo::{DocumentRepository, RepoResult, UpsertOutcome};

/// Use-case service wrapper for document operations.
pub struct DocumentService<R: DocumentRepository> {
    repo: R,
}

impl<R: DocumentRepository> DocumentService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Gets one document by public id.
    ///
    /// Returns `RepoError::NotFound` when nothing is stored under `id`.
    pub fn get_document(&self, id: &str) -> RepoResult<Document> {
        self.repo.search_by_id(id)
    }

    /// Inserts or overwrites a document.
    pub fn upsert_document(&self, document: &Document) -> RepoResult<UpsertOutcome> {
        self.repo.create_document(document)
    }

    /// Parses one JSON document and upserts it.
    ///
    /// # Errors
    /// - `RepoError::Validation` carrying the failing field path when the
    ///   text is not a valid document. Nothing is written in that case.
    pub fn import_json(&self, text: &str) -> RepoResult<UpsertOutcome> {
        let document = Document::from_json(text)?;
        self.repo.create_document(&document)
    }
}
