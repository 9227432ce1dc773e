//! Document repository contract and SQLite-backed collection handle.
//!
//! # Responsibility
//! - Provide find-by-id and upsert over one named collection.
//! - Keep SQL and JSON storage details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Document::validate()` before any SQL mutation.
//! - Read paths reject invalid persisted state instead of masking it.
//! - An upsert leaves exactly one record per `(collection, _id)`.

use crate::config::{validate_collection_name, ConfigError};
use crate::db::DbError;
use crate::model::document::{Document, DocumentId, DocumentValidationError};
use crate::repo::fields::{from_storage_fields, to_storage_fields, FieldMap};
use log::{error, info};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for document persistence and lookup.
#[derive(Debug)]
pub enum RepoError {
    Validation(DocumentValidationError),
    Db(DbError),
    Config(ConfigError),
    NotFound(DocumentId),
    /// A concurrent insert claimed the same primary key.
    DuplicateKey(DocumentId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "document not found: {id}"),
            Self::DuplicateKey(id) => write!(f, "duplicate document id: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted document data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::NotFound(_) | Self::DuplicateKey(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DocumentValidationError> for RepoError {
    fn from(value: DocumentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<ConfigError> for RepoError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Result of an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No record existed; a new one was created under this id.
    Inserted(DocumentId),
    /// An existing record was overwritten in place.
    Updated,
}

impl UpsertOutcome {
    /// Id of the newly created record, `None` when an update happened.
    pub fn upserted_id(&self) -> Option<&str> {
        match self {
            Self::Inserted(id) => Some(id.as_str()),
            Self::Updated => None,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// Repository interface for document lookup and upsert.
pub trait DocumentRepository {
    fn search_by_id(&self, id: &str) -> RepoResult<Document>;
    fn create_document(&self, document: &Document) -> RepoResult<UpsertOutcome>;
}

impl<T: DocumentRepository + ?Sized> DocumentRepository for &T {
    fn search_by_id(&self, id: &str) -> RepoResult<Document> {
        (**self).search_by_id(id)
    }

    fn create_document(&self, document: &Document) -> RepoResult<UpsertOutcome> {
        (**self).create_document(document)
    }
}

/// Handle to one collection inside an open store connection.
pub struct DocumentCollection<'conn> {
    conn: &'conn Connection,
    name: String,
}

impl<'conn> DocumentCollection<'conn> {
    /// Creates a handle after checking the collection name.
    pub fn try_new(conn: &'conn Connection, name: impl Into<String>) -> RepoResult<Self> {
        let name = name.into();
        validate_collection_name(&name)?;
        Ok(Self { conn, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of records stored in this collection.
    pub fn count_documents(&self) -> RepoResult<u64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1;",
            [self.name.as_str()],
            |row| row.get::<_, i64>(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative record count {count}")))
    }

    fn upsert_fields(&self, id: &str, fields: FieldMap) -> RepoResult<UpsertOutcome> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let outcome = match load_fields(&tx, &self.name, id)? {
            Some(mut current) => {
                current.extend(fields);
                tx.execute(
                    "UPDATE records
                     SET
                        fields = ?1,
                        updated_at = (strftime('%s', 'now') * 1000)
                     WHERE collection = ?2 AND _id = ?3;",
                    params![encode_fields(&current)?, self.name.as_str(), id],
                )?;
                UpsertOutcome::Updated
            }
            None => {
                let inserted = tx.execute(
                    "INSERT INTO records (collection, _id, fields) VALUES (?1, ?2, ?3);",
                    params![self.name.as_str(), id, encode_fields(&fields)?],
                );
                if let Err(err) = inserted {
                    return Err(map_insert_error(err, id));
                }
                UpsertOutcome::Inserted(id.to_string())
            }
        };

        tx.commit()?;
        Ok(outcome)
    }
}

impl DocumentRepository for DocumentCollection<'_> {
    fn search_by_id(&self, id: &str) -> RepoResult<Document> {
        let started_at = Instant::now();
        let result = load_fields(self.conn, &self.name, id).and_then(|fields| {
            let fields = fields.ok_or_else(|| RepoError::NotFound(id.to_string()))?;
            let document = from_storage_fields(fields)?;
            if document.id != id {
                return Err(RepoError::InvalidData(format!(
                    "record keyed `{id}` carries id `{}`",
                    document.id
                )));
            }
            Ok(document)
        });

        match &result {
            Ok(_) => info!(
                "event=document_search module=repo status=ok collection={} duration_ms={}",
                self.name,
                started_at.elapsed().as_millis()
            ),
            Err(RepoError::NotFound(_)) => info!(
                "event=document_search module=repo status=not_found collection={} duration_ms={}",
                self.name,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=document_search module=repo status=error collection={} duration_ms={} error={}",
                self.name,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn create_document(&self, document: &Document) -> RepoResult<UpsertOutcome> {
        let started_at = Instant::now();
        document.validate()?;

        let result = to_storage_fields(document)
            .and_then(|fields| self.upsert_fields(&document.id, fields));

        match &result {
            Ok(outcome) => info!(
                "event=document_upsert module=repo status=ok collection={} outcome={} duration_ms={}",
                self.name,
                if outcome.is_insert() { "inserted" } else { "updated" },
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=document_upsert module=repo status=error collection={} duration_ms={} error={}",
                self.name,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

fn load_fields(conn: &Connection, collection: &str, id: &str) -> RepoResult<Option<FieldMap>> {
    let text: Option<String> = conn
        .query_row(
            "SELECT fields FROM records WHERE collection = ?1 AND _id = ?2;",
            params![collection, id],
            |row| row.get(0),
        )
        .optional()?;

    text.map(|text| {
        serde_json::from_str::<FieldMap>(&text).map_err(|err| {
            RepoError::InvalidData(format!("record `{id}` is not a JSON object: {err}"))
        })
    })
    .transpose()
}

fn encode_fields(fields: &FieldMap) -> RepoResult<String> {
    serde_json::to_string(fields)
        .map_err(|err| RepoError::InvalidData(format!("field encoding failed: {err}")))
}

fn map_insert_error(err: rusqlite::Error, id: &str) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if failure.code == ErrorCode::ConstraintViolation
            && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        {
            return RepoError::DuplicateKey(id.to_string());
        }
    }
    err.into()
}
