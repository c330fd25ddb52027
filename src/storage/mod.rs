pub mod blob;
pub mod database;
pub mod document;
pub mod document_store;

pub use blob::{BlobStore, LocalBlobStore, SharedBlobStore};
pub use database::{Database, PoolConfig, SharedDatabase};
pub use document::{
    ChangeEvent, ChangeKind, Document, DocumentStore, SharedDocumentStore, Subscription,
};
pub use document_store::SqliteDocumentStore;
