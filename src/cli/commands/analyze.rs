//! Analyze Command
//!
//! Runs one behavior analysis and optionally saves it to the pet's journal.
//!
//! Usage:
//!   pawcare analyze --pet <id> --behavior "..." [--context "..."] [--image photo.jpg] [--save]
//!   pawcare analyze --species Dog --breed Beagle --behavior "..."

use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::debug;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, format_size};
use crate::types::{
    AnalysisRequest, ImageAttachment, PawError, PetId, Result, SubjectProfile,
    ValidationErrorKind,
};

/// Arguments of the analyze command
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub pet: Option<String>,
    pub species: Option<String>,
    pub breed: Option<String>,
    pub color: Option<String>,
    pub born: Option<NaiveDate>,
    pub behavior: String,
    pub context: Option<String>,
    pub image: Option<PathBuf>,
    pub save: bool,
}

pub async fn run(ctx: &CommandContext, options: AnalyzeOptions) -> Result<()> {
    let output = Output::new();
    let request = build_request(ctx, &options)?;

    if options.save && options.pet.is_none() {
        return Err(PawError::validation(
            ValidationErrorKind::MissingField,
            "pet",
            "Saving an analysis requires --pet",
        ));
    }

    if let Some(image) = &request.image {
        output.info(&format!(
            "Analyzing with image ({}, {})",
            image.mime_type,
            format_size(image.size_bytes())
        ));
    }

    let analyzer = ctx.analyzer()?;
    let report = analyzer.analyze_with_report(&request).await?;

    output.header("Behavior Analysis");
    output.field("Species", &request.subject.species);
    output.field(
        "Answered by",
        &format!("{} ({})", report.result.provider, report.result.model),
    );
    if !report.attempts.is_empty() {
        let stages: Vec<&str> = report.attempts.iter().map(|a| a.stage).collect();
        output.field("Fell back", &format!("after {}", stages.join(", ")));
    }
    println!();
    output.body(&report.result.text);

    let Some(pet_id) = options.pet.as_deref().map(PetId::from) else {
        return Ok(());
    };

    if !options.save {
        output.hint("\nRe-run with --save to keep this analysis in the pet's history.");
        return Ok(());
    }

    let saved = ctx.registry.journal().save_with_photo(
        &ctx.session,
        &pet_id,
        &request,
        &report.result,
    )?;

    println!();
    output.success(&format!("Saved analysis {}", saved.id));
    Ok(())
}

/// Resolve the subject and assemble the request without calling any provider
pub fn build_request(ctx: &CommandContext, options: &AnalyzeOptions) -> Result<AnalysisRequest> {
    let subject = match (&options.pet, &options.species) {
        (Some(pet_id), _) => {
            let pet = ctx.registry.get(&ctx.session, &PetId::from(pet_id.as_str()))?;
            debug!(pet_id = %pet.id, "Using stored pet profile");
            pet.profile()
        }
        (None, Some(species)) => {
            let mut subject = SubjectProfile::new(species.as_str());
            subject.breed = options.breed.clone();
            subject.color_markings = options.color.clone();
            subject.date_of_birth = options.born;
            subject
        }
        (None, None) => {
            return Err(PawError::validation(
                ValidationErrorKind::MissingField,
                "species",
                "Either --pet or --species is required",
            ));
        }
    };

    let mut request = AnalysisRequest::new(subject, options.behavior.as_str())
        .with_context(options.context.clone().unwrap_or_default());

    if let Some(path) = &options.image {
        request = request.with_image(ImageAttachment::from_path(path)?);
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::tests::context;
    use crate::types::Pet;

    #[test]
    fn test_request_from_stored_pet() {
        let (_dir, ctx) = context();
        let mut pet = Pet::new(&ctx.session, "Rex", "Dog");
        pet.breed = Some("Beagle".to_string());
        pet.color = Some("Tricolor".to_string());
        let pet = ctx.registry.register(&ctx.session, pet).unwrap();

        let options = AnalyzeOptions {
            pet: Some(pet.id.to_string()),
            species: Some("Cat".to_string()),
            behavior: "Barks at night".to_string(),
            ..Default::default()
        };
        let request = build_request(&ctx, &options).unwrap();

        assert_eq!(request.subject.species, "Dog");
        assert_eq!(request.subject.color_markings.as_deref(), Some("Tricolor"));
        assert_eq!(request.context_text, "");
        assert!(request.image.is_none());
    }

    #[test]
    fn test_request_from_inline_profile() {
        let (dir, ctx) = context();
        let image = dir.path().join("photo.png");
        std::fs::write(&image, [0x89, b'P', b'N', b'G']).unwrap();

        let options = AnalyzeOptions {
            species: Some("Bird".to_string()),
            breed: Some("Parrot".to_string()),
            behavior: "Plucks feathers".to_string(),
            context: Some("After moving house".to_string()),
            image: Some(image),
            ..Default::default()
        };
        let request = build_request(&ctx, &options).unwrap();

        assert_eq!(request.subject.species, "Bird");
        assert_eq!(request.subject.breed.as_deref(), Some("Parrot"));
        assert_eq!(request.context_text, "After moving house");
        assert_eq!(request.image.unwrap().mime_type, "image/png");
    }

    #[test]
    fn test_request_requires_subject() {
        let (_dir, ctx) = context();
        let options = AnalyzeOptions {
            behavior: "Hides".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            build_request(&ctx, &options),
            Err(PawError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_pet_is_not_found() {
        let (_dir, ctx) = context();
        let options = AnalyzeOptions {
            pet: Some("missing".to_string()),
            behavior: "Hides".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            build_request(&ctx, &options),
            Err(PawError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_without_pet_rejected_before_analysis() {
        let (_dir, ctx) = context();
        let options = AnalyzeOptions {
            species: Some("Dog".to_string()),
            behavior: "Chews shoes".to_string(),
            save: true,
            ..Default::default()
        };
        assert!(matches!(
            run(&ctx, options).await,
            Err(PawError::Validation(_))
        ));
    }
}
