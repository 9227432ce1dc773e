//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite and JSON storage details from service orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Document::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateKey`) in
//!   addition to DB transport errors.

pub mod document_repo;
pub mod fields;
