use paperstore_core::db::DbError;
use paperstore_core::{
    open_collection, with_collection, Document, DocumentRepository, DocumentService, RepoError,
    StoreConfig, UpsertOutcome,
};
use serde_json::json;
use std::path::Path;
use std::thread;

fn paper(id: &str, title: &str) -> Document {
    Document::from_value(json!({
        "id": id,
        "abstract": "abstract",
        "body": [{ "paragraph_id": 0, "section": "intro", "text": "hello" }],
        "summary": {
            "domain": "systems",
            "problem": "latency",
            "solution": "batching",
            "keywords": ["io"]
        },
        "reference": [],
        "title": title
    }))
    .unwrap()
}

fn config_in(dir: &Path) -> StoreConfig {
    StoreConfig::new(dir.to_str().unwrap(), "papers", "documents").unwrap()
}

#[test]
fn with_collection_persists_across_acquisitions() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let outcome =
        with_collection(&config, |collection| collection.create_document(&paper("p-1", "First")))
            .unwrap();
    assert_eq!(outcome, UpsertOutcome::Inserted("p-1".to_string()));

    let loaded = with_collection(&config, |collection| collection.search_by_id("p-1")).unwrap();
    assert_eq!(loaded.title, "First");
    assert!(dir.path().join("papers.sqlite3").is_file());
}

#[test]
fn with_collection_returns_closure_errors_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let err = with_collection(&config, |collection| collection.search_by_id("nope")).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == "nope"));

    // The failed call released its connection, so the store is still usable.
    let count = with_collection(&config, |collection| collection.count_documents()).unwrap();
    assert_eq!(count, 0);
}

#[test]
fn with_collection_accepts_caller_error_types() {
    #[derive(Debug)]
    enum AppError {
        Repo(RepoError),
        Rejected,
    }

    impl From<RepoError> for AppError {
        fn from(value: RepoError) -> Self {
            Self::Repo(value)
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let result: Result<(), AppError> = with_collection(&config, |_collection| Err(AppError::Rejected));
    assert!(matches!(result, Err(AppError::Rejected)));

    let result: Result<Document, AppError> =
        with_collection(&config, |collection| Ok(collection.search_by_id("x")?));
    assert!(matches!(result, Err(AppError::Repo(RepoError::NotFound(_)))));
}

#[test]
fn guard_close_reports_success() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let guard = open_collection(&config).unwrap();
    let service = DocumentService::new(guard.collection().unwrap());
    service.upsert_document(&paper("p-1", "Guarded")).unwrap();
    drop(service);
    guard.close().unwrap();

    let guard = open_collection(&config).unwrap();
    let collection = guard.collection().unwrap();
    assert_eq!(collection.search_by_id("p-1").unwrap().title, "Guarded");
}

#[test]
fn memory_store_is_private_to_each_acquisition() {
    let config = StoreConfig::new(":memory:", "papers", "documents").unwrap();

    with_collection(&config, |collection| collection.create_document(&paper("p-1", "Gone")))
        .unwrap();

    let err = with_collection(&config, |collection| collection.search_by_id("p-1")).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[test]
fn store_directory_is_created_on_first_use() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("data").join("store");
    let config = config_in(&nested);

    with_collection(&config, |collection| collection.count_documents()).unwrap();
    assert!(nested.join("papers.sqlite3").is_file());
}

#[test]
fn unusable_store_directory_reports_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let config = config_in(&blocker.join("sub"));

    let err = with_collection(&config, |collection| collection.search_by_id("p-1")).unwrap_err();
    match err {
        RepoError::Db(DbError::Io { path, .. }) => assert_eq!(path, blocker.join("sub")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn concurrent_upserts_leave_one_complete_write() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    // Create the schema up front so both writers start from the same store.
    with_collection(&config, |collection| collection.count_documents()).unwrap();

    let handles: Vec<_> = ["Writer A", "Writer B"]
        .into_iter()
        .map(|title| {
            let config = config.clone();
            thread::spawn(move || {
                with_collection(&config, |collection| {
                    collection.create_document(&paper("shared", title))
                })
                .unwrap()
            })
        })
        .collect();

    let outcomes: Vec<UpsertOutcome> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    let inserts = outcomes.iter().filter(|outcome| outcome.is_insert()).count();
    assert_eq!(inserts, 1);

    let (count, stored) = with_collection(&config, |collection| {
        Ok::<_, RepoError>((collection.count_documents()?, collection.search_by_id("shared")?))
    })
    .unwrap();
    assert_eq!(count, 1);
    assert!(stored.title == "Writer A" || stored.title == "Writer B");
    assert_eq!(stored, paper("shared", &stored.title));
}
