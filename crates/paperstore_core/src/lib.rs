//! Core data access for stored paper documents.
//! This crate owns the document schema and the only read/write paths to the
//! document collection.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::document::{Body, Document, DocumentId, DocumentValidationError, Figure, Summary};
pub use repo::document_repo::{
    DocumentCollection, DocumentRepository, RepoError, RepoResult, UpsertOutcome,
};
pub use service::document_service::DocumentService;
pub use store::{open_collection, with_collection, CollectionGuard};

/// Looks up one document in `collection`.
///
/// Free-function form of `DocumentRepository::search_by_id`.
pub fn search_by_id(collection: &impl DocumentRepository, id: &str) -> RepoResult<Document> {
    collection.search_by_id(id)
}

/// Upserts `document` into `collection`.
///
/// Free-function form of `DocumentRepository::create_document`.
pub fn create_document(
    collection: &impl DocumentRepository,
    document: &Document,
) -> RepoResult<UpsertOutcome> {
    collection.create_document(document)
}

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
