//! Domain model for stored paper documents.
//!
//! # Responsibility
//! - Define the schema every stored record must satisfy.
//!
//! # Invariants
//! - Every document is identified by a single non-empty `DocumentId`.
//! - Models are built per request and never cached.

pub mod document;
