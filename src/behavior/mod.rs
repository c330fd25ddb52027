//! Pet records and saved behavior analyses
//!
//! Both services take an explicit [`Session`] and only ever touch documents
//! owned by its user.

mod journal;
mod registry;

pub use journal::BehaviorJournal;
pub use registry::PetRegistry;

use crate::constants::storage::PETS;
use crate::storage::{Document, DocumentStore};
use crate::types::{PawError, PetId, Result, Session};

/// Load a pet document, treating another owner's pet as missing
fn owned_pet(docs: &dyn DocumentStore, session: &Session, pet_id: &PetId) -> Result<Document> {
    docs.get(PETS, pet_id.as_str())?
        .filter(|doc| doc.owner_id == session.user_id)
        .ok_or_else(|| PawError::not_found(PETS, pet_id.as_str()))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::{LocalBlobStore, SharedDocumentStore, SqliteDocumentStore};
    use crate::types::Pet;

    pub(crate) struct Fixture {
        pub registry: PetRegistry,
        pub journal: BehaviorJournal,
        pub docs: SharedDocumentStore,
        _blob_dir: tempfile::TempDir,
    }

    pub(crate) fn fixture() -> Fixture {
        let blob_dir = tempfile::tempdir().unwrap();
        let docs: SharedDocumentStore = Arc::new(SqliteDocumentStore::in_memory().unwrap());
        let blobs = Arc::new(LocalBlobStore::new(blob_dir.path()).unwrap());
        let registry = PetRegistry::new(docs.clone(), blobs);

        Fixture {
            journal: registry.journal().clone(),
            registry,
            docs,
            _blob_dir: blob_dir,
        }
    }

    pub(crate) fn register_pet(fx: &Fixture, session: &Session, name: &str) -> Pet {
        fx.registry
            .register(session, Pet::new(session, name, "Dog"))
            .unwrap()
    }
}
