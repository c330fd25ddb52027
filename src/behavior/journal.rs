//! Saved behavior analyses
//!
//! An analysis is only persisted when the owner explicitly saves it after it
//! was displayed. Records live in the `behaviorAnalyses` collection, scoped to
//! the session user and tagged with the pet id.

use serde_json::{Value, json};
use tracing::{debug, info};

use super::owned_pet;
use crate::constants::storage::BEHAVIOR_ANALYSES;
use crate::storage::{SharedBlobStore, SharedDocumentStore};
use crate::types::{
    AnalysisRequest, AnalysisResult, ImageAttachment, PetId, Result, SavedAnalysis, Session,
    log_filter_error, log_filter_warn, now_rfc3339,
};

#[derive(Clone)]
pub struct BehaviorJournal {
    docs: SharedDocumentStore,
    blobs: SharedBlobStore,
}

impl BehaviorJournal {
    pub fn new(docs: SharedDocumentStore, blobs: SharedBlobStore) -> Self {
        Self { docs, blobs }
    }

    /// Persist a displayed analysis for one of the session user's pets
    pub fn save(
        &self,
        session: &Session,
        pet_id: &PetId,
        request: &AnalysisRequest,
        result: &AnalysisResult,
        image_reference: Option<String>,
    ) -> Result<SavedAnalysis> {
        owned_pet(self.docs.as_ref(), session, pet_id)?;

        let now = now_rfc3339();
        let record = SavedAnalysis {
            id: uuid::Uuid::new_v4().to_string(),
            pet_id: pet_id.clone(),
            owner_id: session.user_id.clone(),
            behavior_text: request.behavior_text.clone(),
            context_text: request.context_text.clone(),
            analysis_text: result.text.clone(),
            image_reference,
            created_at: now.clone(),
            updated_at: now,
        };

        self.docs.create(
            BEHAVIOR_ANALYSES,
            &record.id,
            &session.user_id,
            serde_json::to_value(&record)?,
        )?;

        info!(analysis_id = %record.id, pet_id = %pet_id, "Saved behavior analysis");
        Ok(record)
    }

    /// Upload the request image (if any) and save the analysis with its URL.
    ///
    /// If the record cannot be written the uploaded image is removed again.
    pub fn save_with_photo(
        &self,
        session: &Session,
        pet_id: &PetId,
        request: &AnalysisRequest,
        result: &AnalysisResult,
    ) -> Result<SavedAnalysis> {
        let image_reference = match &request.image {
            Some(image) => Some(self.attach_photo(session, pet_id, image)?),
            None => None,
        };

        match self.save(session, pet_id, request, result, image_reference.clone()) {
            Ok(record) => Ok(record),
            Err(e) => {
                if let Some(url) = &image_reference {
                    log_filter_warn(self.blobs.delete(url), "removing orphaned analysis image");
                }
                Err(e)
            }
        }
    }

    /// Saved analyses of a pet, newest first
    pub fn list_for_pet(&self, session: &Session, pet_id: &PetId) -> Result<Vec<SavedAnalysis>> {
        let mut records: Vec<SavedAnalysis> = self
            .docs
            .list(BEHAVIOR_ANALYSES, &session.user_id)?
            .iter()
            .filter(|doc| doc.data.get("petId") == Some(&json!(pet_id.as_str())))
            .filter_map(|doc| log_filter_error(doc.decode(), "decoding saved analysis"))
            .collect();

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// Upload the analysis image; the URL becomes the record's image reference
    pub fn attach_photo(
        &self,
        session: &Session,
        pet_id: &PetId,
        image: &ImageAttachment,
    ) -> Result<String> {
        image.validate()?;
        owned_pet(self.docs.as_ref(), session, pet_id)?;

        let path = format!(
            "users/{}/pets/{}/behavior/{}.{}",
            session.user_id,
            pet_id,
            uuid::Uuid::new_v4(),
            image.extension()
        );
        self.blobs.upload(&path, &image.bytes)
    }

    /// Remove every saved analysis of a pet (and its image, best effort).
    ///
    /// Works on the raw documents so records that no longer decode are removed
    /// too.
    pub fn delete_for_pet(&self, session: &Session, pet_id: &PetId) -> Result<usize> {
        let docs: Vec<_> = self
            .docs
            .list(BEHAVIOR_ANALYSES, &session.user_id)?
            .into_iter()
            .filter(|doc| doc.data.get("petId") == Some(&json!(pet_id.as_str())))
            .collect();

        for doc in &docs {
            self.docs.delete(BEHAVIOR_ANALYSES, &doc.id)?;
            if let Some(url) = doc.data.get("imageReference").and_then(Value::as_str) {
                log_filter_warn(self.blobs.delete(url), "removing analysis image");
            }
        }

        debug!(pet_id = %pet_id, removed = docs.len(), "Deleted saved analyses");
        Ok(docs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::behavior::PetRegistry;
    use crate::behavior::tests::{fixture, register_pet};
    use crate::storage::{
        Document, DocumentStore, LocalBlobStore, SqliteDocumentStore, Subscription,
    };
    use crate::types::{PawError, Pet, SubjectProfile, UserId};

    fn result(text: &str) -> AnalysisResult {
        AnalysisResult {
            text: text.to_string(),
            provider: "openai".to_string(),
            model: "gpt-3.5-turbo".to_string(),
        }
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::new(SubjectProfile::new("Dog"), "Digs holes").with_context("In the garden")
    }

    #[test]
    fn test_save_and_list_newest_first() {
        let fx = fixture();
        let session = Session::new("alice");
        let pet = register_pet(&fx, &session, "Rex");

        let first = fx
            .journal
            .save(&session, &pet.id, &request(), &result("First"), None)
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = fx
            .journal
            .save(&session, &pet.id, &request(), &result("Second"), None)
            .unwrap();

        let listed = fx.journal.list_for_pet(&session, &pet.id).unwrap();
        let ids: Vec<&str> = listed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
        assert_eq!(listed[0].context_text, "In the garden");
        assert_eq!(listed[0].owner_id, session.user_id);
    }

    #[test]
    fn test_list_is_scoped_to_pet() {
        let fx = fixture();
        let session = Session::new("alice");
        let rex = register_pet(&fx, &session, "Rex");
        let tom = register_pet(&fx, &session, "Tom");

        fx.journal
            .save(&session, &rex.id, &request(), &result("Rex only"), None)
            .unwrap();

        assert_eq!(fx.journal.list_for_pet(&session, &rex.id).unwrap().len(), 1);
        assert!(fx.journal.list_for_pet(&session, &tom.id).unwrap().is_empty());
    }

    #[test]
    fn test_cannot_save_for_foreign_pet() {
        let fx = fixture();
        let pet = register_pet(&fx, &Session::new("alice"), "Rex");

        let err = fx
            .journal
            .save(&Session::new("mallory"), &pet.id, &request(), &result("x"), None)
            .unwrap_err();
        assert!(matches!(err, PawError::NotFound { .. }));
    }

    #[test]
    fn test_attach_photo_path_and_cascade() {
        let fx = fixture();
        let session = Session::new("alice");
        let pet = register_pet(&fx, &session, "Rex");

        let image = ImageAttachment::new("image/jpeg", vec![0xFF, 0xD8]);
        let url = fx.journal.attach_photo(&session, &pet.id, &image).unwrap();
        let prefix = format!("users/alice/pets/{}/behavior/", pet.id);
        assert!(url.contains(&prefix));
        assert!(url.ends_with(".jpg"));

        fx.journal
            .save(&session, &pet.id, &request(), &result("With photo"), Some(url.clone()))
            .unwrap();

        let removed = fx.journal.delete_for_pet(&session, &pet.id).unwrap();
        assert_eq!(removed, 1);
        assert!(fx.journal.list_for_pet(&session, &pet.id).unwrap().is_empty());

        let path = url::Url::parse(&url).unwrap().to_file_path().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_attach_rejects_invalid_image() {
        let fx = fixture();
        let session = Session::new("alice");
        let pet = register_pet(&fx, &session, "Rex");

        let pdf = ImageAttachment::new("application/pdf", vec![1]);
        assert!(matches!(
            fx.journal.attach_photo(&session, &pet.id, &pdf),
            Err(PawError::Validation(_))
        ));
    }

    #[test]
    fn test_save_with_photo_stores_reference() {
        let fx = fixture();
        let session = Session::new("alice");
        let pet = register_pet(&fx, &session, "Rex");

        let with_image =
            request().with_image(ImageAttachment::new("image/png", vec![0x89, b'P', b'N', b'G']));
        let saved = fx
            .journal
            .save_with_photo(&session, &pet.id, &with_image, &result("Curious"))
            .unwrap();

        let url = saved.image_reference.unwrap();
        assert!(url.ends_with(".png"));
        assert!(url::Url::parse(&url).unwrap().to_file_path().unwrap().exists());

        let plain = fx
            .journal
            .save_with_photo(&session, &pet.id, &request(), &result("Calm"))
            .unwrap();
        assert!(plain.image_reference.is_none());
    }

    /// Delegates to SQLite but refuses to write saved analyses
    struct RejectAnalyses(SqliteDocumentStore);

    impl DocumentStore for RejectAnalyses {
        fn create(
            &self,
            collection: &str,
            id: &str,
            owner: &UserId,
            data: Value,
        ) -> Result<Document> {
            if collection == BEHAVIOR_ANALYSES {
                return Err(PawError::Storage("disk full".to_string()));
            }
            self.0.create(collection, id, owner, data)
        }

        fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
            self.0.get(collection, id)
        }

        fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Document> {
            self.0.update(collection, id, patch)
        }

        fn delete(&self, collection: &str, id: &str) -> Result<Option<Document>> {
            self.0.delete(collection, id)
        }

        fn list(&self, collection: &str, owner: &UserId) -> Result<Vec<Document>> {
            self.0.list(collection, owner)
        }

        fn subscribe(&self, collection: &str, owner: &UserId) -> Result<Subscription> {
            self.0.subscribe(collection, owner)
        }
    }

    #[test]
    fn test_failed_save_removes_uploaded_photo() {
        let blob_dir = tempfile::tempdir().unwrap();
        let registry = PetRegistry::new(
            Arc::new(RejectAnalyses(SqliteDocumentStore::in_memory().unwrap())),
            Arc::new(LocalBlobStore::new(blob_dir.path()).unwrap()),
        );
        let session = Session::new("alice");
        let pet = registry
            .register(&session, Pet::new(&session, "Rex", "Dog"))
            .unwrap();

        let with_image =
            request().with_image(ImageAttachment::new("image/jpeg", vec![0xFF, 0xD8]));
        let err = registry
            .journal()
            .save_with_photo(&session, &pet.id, &with_image, &result("Lost"))
            .unwrap_err();
        assert!(matches!(err, PawError::Storage(_)));

        let behavior_dir = blob_dir
            .path()
            .join(format!("users/alice/pets/{}/behavior", pet.id));
        let leftover = std::fs::read_dir(&behavior_dir)
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftover, 0);
    }

    #[test]
    fn test_delete_for_pet_removes_undecodable_records() {
        let fx = fixture();
        let session = Session::new("alice");
        let rex = register_pet(&fx, &session, "Rex");
        let tom = register_pet(&fx, &session, "Tom");

        fx.journal
            .save(&session, &rex.id, &request(), &result("Valid"), None)
            .unwrap();
        fx.docs
            .create(
                BEHAVIOR_ANALYSES,
                "broken",
                &session.user_id,
                json!({ "petId": rex.id.as_str(), "junk": true }),
            )
            .unwrap();
        fx.journal
            .save(&session, &tom.id, &request(), &result("Other pet"), None)
            .unwrap();

        // The malformed record is skipped when listing
        assert_eq!(fx.journal.list_for_pet(&session, &rex.id).unwrap().len(), 1);

        assert_eq!(fx.journal.delete_for_pet(&session, &rex.id).unwrap(), 2);
        assert!(fx.docs.get(BEHAVIOR_ANALYSES, "broken").unwrap().is_none());
        assert_eq!(fx.journal.list_for_pet(&session, &tom.id).unwrap().len(), 1);
    }
}
