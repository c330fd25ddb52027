//! Owner-scoped pet records

use serde_json::json;
use tracing::info;

use super::{BehaviorJournal, owned_pet};
use crate::constants::storage::PETS;
use crate::storage::{SharedBlobStore, SharedDocumentStore, Subscription};
use crate::types::{
    ImageAttachment, PawError, Pet, PetId, Result, Session, ValidationErrorKind,
    log_filter_error, log_filter_warn, now_rfc3339,
};

#[derive(Clone)]
pub struct PetRegistry {
    docs: SharedDocumentStore,
    blobs: SharedBlobStore,
    journal: BehaviorJournal,
}

impl PetRegistry {
    pub fn new(docs: SharedDocumentStore, blobs: SharedBlobStore) -> Self {
        let journal = BehaviorJournal::new(docs.clone(), blobs.clone());
        Self {
            docs,
            blobs,
            journal,
        }
    }

    pub fn journal(&self) -> &BehaviorJournal {
        &self.journal
    }

    /// Store a new pet for the session user
    pub fn register(&self, session: &Session, mut pet: Pet) -> Result<Pet> {
        if pet.name.trim().is_empty() {
            return Err(PawError::validation(
                ValidationErrorKind::MissingField,
                "name",
                "Pet name is required",
            ));
        }
        if pet.species.trim().is_empty() {
            return Err(PawError::validation(
                ValidationErrorKind::MissingField,
                "species",
                "Species is required",
            ));
        }

        pet.owner_id = session.user_id.clone();
        self.docs.create(
            PETS,
            pet.id.as_str(),
            &session.user_id,
            serde_json::to_value(&pet)?,
        )?;

        info!(pet_id = %pet.id, species = %pet.species, "Registered pet");
        Ok(pet)
    }

    /// Fetch one pet; another owner's pet is reported as not found
    pub fn get(&self, session: &Session, pet_id: &PetId) -> Result<Pet> {
        owned_pet(self.docs.as_ref(), session, pet_id)?.decode()
    }

    /// All of the session user's pets, oldest first
    pub fn list(&self, session: &Session) -> Result<Vec<Pet>> {
        Ok(self
            .docs
            .list(PETS, &session.user_id)?
            .iter()
            .filter_map(|doc| log_filter_error(doc.decode(), "decoding pet"))
            .collect())
    }

    /// Live view of the session user's pet documents
    pub fn watch(&self, session: &Session) -> Result<Subscription> {
        self.docs.subscribe(PETS, &session.user_id)
    }

    /// Delete a pet with its saved analyses and photo
    pub fn delete(&self, session: &Session, pet_id: &PetId) -> Result<()> {
        let pet = self.get(session, pet_id)?;

        let removed = self.journal.delete_for_pet(session, pet_id)?;
        if let Some(url) = &pet.photo_url {
            log_filter_warn(self.blobs.delete(url), "removing pet photo");
        }
        self.docs.delete(PETS, pet_id.as_str())?;

        info!(pet_id = %pet_id, analyses_removed = removed, "Deleted pet");
        Ok(())
    }

    /// Replace the pet's profile photo
    pub fn upload_photo(
        &self,
        session: &Session,
        pet_id: &PetId,
        image: &ImageAttachment,
    ) -> Result<Pet> {
        image.validate()?;
        let pet = self.get(session, pet_id)?;

        let path = format!(
            "users/{}/pets/{}/{}.{}",
            session.user_id,
            pet_id,
            uuid::Uuid::new_v4(),
            image.extension()
        );
        let url = self.blobs.upload(&path, &image.bytes)?;

        if let Some(old) = &pet.photo_url {
            log_filter_warn(self.blobs.delete(old), "removing previous pet photo");
        }

        self.docs
            .update(
                PETS,
                pet_id.as_str(),
                json!({ "photoUrl": url, "updatedAt": now_rfc3339() }),
            )?
            .decode()
    }
}
