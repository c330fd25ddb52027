//! History Command
//!
//! Lists the saved analyses of one pet, newest first.

use crate::cli::commands::ListFormat;
use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::types::{PetId, Result};

pub fn run(ctx: &CommandContext, pet: &str, format: ListFormat) -> Result<()> {
    let pet = ctx.registry.get(&ctx.session, &PetId::from(pet))?;
    let records = ctx.registry.journal().list_for_pet(&ctx.session, &pet.id)?;

    if format == ListFormat::Json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    let output = Output::new();
    output.header(&format!("Behavior history for {}", pet.name));

    if records.is_empty() {
        output.info("No saved analyses yet. Use `pawcare analyze --pet <id> --save`.");
        return Ok(());
    }

    for record in &records {
        output.section(&record.created_at);
        output.field("Behavior", &record.behavior_text);
        if !record.context_text.is_empty() {
            output.field("Context", &record.context_text);
        }
        if let Some(image) = &record.image_reference {
            output.field("Image", image);
        }
        println!();
        output.body(&record.analysis_text);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::tests::context;
    use crate::types::{AnalysisRequest, AnalysisResult, PawError, Pet, Session, SubjectProfile};

    #[test]
    fn test_history_for_saved_pet() {
        let (_dir, ctx) = context();
        let pet = ctx
            .registry
            .register(&ctx.session, Pet::new(&ctx.session, "Tom", "Cat"))
            .unwrap();
        let result = AnalysisResult {
            text: "Territorial marking".to_string(),
            provider: "openai".to_string(),
            model: "gpt-3.5-turbo".to_string(),
        };
        ctx.registry
            .journal()
            .save(
                &ctx.session,
                &pet.id,
                &AnalysisRequest::new(SubjectProfile::new("Cat"), "Sprays walls"),
                &result,
                None,
            )
            .unwrap();

        assert!(run(&ctx, pet.id.as_str(), ListFormat::Text).is_ok());
        assert!(run(&ctx, pet.id.as_str(), ListFormat::Json).is_ok());
    }

    #[test]
    fn test_history_of_foreign_pet_fails() {
        let (_dir, ctx) = context();
        let other = Session::new("someone-else");
        let pet = ctx
            .registry
            .register(&other, Pet::new(&other, "Rex", "Dog"))
            .unwrap();

        assert!(matches!(
            run(&ctx, pet.id.as_str(), ListFormat::Text),
            Err(PawError::NotFound { .. })
        ));
    }
}
