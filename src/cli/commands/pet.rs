//! Pet Command
//!
//! Usage:
//!   pawcare pet add --name Rex --species Dog [--breed ..] [--color ..] [--born 2020-01-31] [--photo rex.jpg]
//!   pawcare pet list [-f json]
//!   pawcare pet remove <id>

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};

use crate::cli::commands::ListFormat;
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, describe_birth_date};
use crate::types::{ImageAttachment, Pet, PetId, Result};

/// Arguments of `pet add`
#[derive(Debug, Clone, Default)]
pub struct NewPet {
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub color: Option<String>,
    pub born: Option<NaiveDate>,
    pub photo: Option<PathBuf>,
}

pub fn add(ctx: &CommandContext, input: NewPet) -> Result<Pet> {
    let mut pet = Pet::new(&ctx.session, input.name, input.species);
    pet.breed = input.breed;
    pet.color = input.color;
    pet.date_of_birth = input.born;

    let mut pet = ctx.registry.register(&ctx.session, pet)?;
    if let Some(path) = &input.photo {
        let image = ImageAttachment::from_path(path)?;
        pet = ctx.registry.upload_photo(&ctx.session, &pet.id, &image)?;
    }

    Output::new().success(&format!("Registered {} ({})", pet.name, pet.id));
    Ok(pet)
}

pub fn list(ctx: &CommandContext, format: ListFormat) -> Result<()> {
    let pets = ctx.registry.list(&ctx.session)?;

    if format == ListFormat::Json {
        println!("{}", serde_json::to_string_pretty(&pets)?);
        return Ok(());
    }

    let output = Output::new();
    output.header(&format!("Pets of {}", ctx.session.user_id));
    if pets.is_empty() {
        output.info("No pets registered. Use `pawcare pet add`.");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    for pet in &pets {
        let age = pet
            .profile()
            .age_in_years(today)
            .map(|years| format!(", {} years", years))
            .unwrap_or_default();
        let detail = format!(
            "{}{} | born {} | {}",
            pet.breed.as_deref().unwrap_or("unknown breed"),
            age,
            describe_birth_date(pet.date_of_birth),
            pet.id
        );
        output.item(&format!("{} ({})", pet.name, pet.species), Some(&detail));
    }
    Ok(())
}

pub fn remove(ctx: &CommandContext, id: &str) -> Result<()> {
    let pet_id = PetId::from(id);
    let pet = ctx.registry.get(&ctx.session, &pet_id)?;
    ctx.registry.delete(&ctx.session, &pet_id)?;

    Output::new().success(&format!("Removed {} and its saved analyses", pet.name));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::tests::context;
    use crate::types::PawError;

    #[test]
    fn test_add_list_remove() {
        let (dir, ctx) = context();
        let photo = dir.path().join("rex.jpg");
        std::fs::write(&photo, [0xFF, 0xD8, 0xFF]).unwrap();

        let pet = add(
            &ctx,
            NewPet {
                name: "Rex".to_string(),
                species: "Dog".to_string(),
                born: NaiveDate::from_ymd_opt(2019, 5, 1),
                photo: Some(photo),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(pet.owner_id.as_str(), "tester");
        assert!(pet.photo_url.as_deref().unwrap().ends_with(".jpg"));
        assert!(list(&ctx, ListFormat::Text).is_ok());
        assert_eq!(ctx.registry.list(&ctx.session).unwrap().len(), 1);

        remove(&ctx, pet.id.as_str()).unwrap();
        assert!(ctx.registry.list(&ctx.session).unwrap().is_empty());
        assert!(matches!(
            remove(&ctx, pet.id.as_str()),
            Err(PawError::NotFound { .. })
        ));
    }

    #[test]
    fn test_add_rejects_non_image_photo() {
        let (dir, ctx) = context();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "not a photo").unwrap();

        let err = add(
            &ctx,
            NewPet {
                name: "Tom".to_string(),
                species: "Cat".to_string(),
                photo: Some(notes),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, PawError::Validation(_)));
    }
}
