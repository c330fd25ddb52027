//! Prompt Builder System
//!
//! Deterministic prompt construction for behavior analysis.
//! The same inputs always render the same string, so prompts can be
//! asserted byte-for-byte without touching the network.
//!
//! ## Layout
//!
//! 1. **Role**: Veterinary behavior expert instruction
//! 2. **Subject**: Species always, breed/color/age only when known
//! 3. **Behavior / Context**: Raw user text
//! 4. **Image note**: Only when an image is attached
//! 5. **Response template**: Four fixed sections

use chrono::{NaiveDate, Utc};

use crate::types::SubjectProfile;

const ROLE_INSTRUCTION: &str = "As a veterinary behavior expert, analyze the following pet \
behavior considering the pet's specific characteristics. Please provide professional insights, \
possible causes, and recommendations.";

const IMAGE_NOTE: &str = "I'm also providing an image of the behavior. Please include any \
relevant observations from the image in your analysis.";

/// The four sections every analysis must answer, with their guidance line
const RESPONSE_SECTIONS: [(&str, &str); 4] = [
    (
        "Behavior Analysis",
        "[Your detailed analysis of the behavior, taking into account the pet's species, breed, age, and other characteristics]",
    ),
    (
        "Possible Causes",
        "[List the potential causes, considering breed-specific tendencies and age-related factors]",
    ),
    (
        "Recommendations",
        "[Provide actionable recommendations tailored to this specific pet]",
    ),
    (
        "When to Seek Professional Help",
        "[Specify situations that require veterinary attention]",
    ),
];

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Role instruction
    Role(String),
    /// Bulleted key/value facts under a header (insertion order preserved)
    Facts {
        header: String,
        items: Vec<(String, String)>,
    },
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
    /// Response format template
    Template(Vec<(String, String)>),
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role instruction
    pub fn role(mut self, instruction: &str) -> Self {
        self.sections.push(PromptSection::Role(instruction.to_string()));
        self
    }

    /// Add a facts section
    pub fn facts(mut self, header: &str, items: Vec<(String, String)>) -> Self {
        self.sections.push(PromptSection::Facts {
            header: header.to_string(),
            items,
        });
        self
    }

    /// Add text section
    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.to_string(),
        });
        self
    }

    /// Add text section with header
    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    /// Add the response format template
    pub fn template(mut self, sections: &[(&str, &str)]) -> Self {
        self.sections.push(PromptSection::Template(
            sections
                .iter()
                .map(|(h, g)| (h.to_string(), g.to_string()))
                .collect(),
        ));
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role(instruction) => {
                    prompt.push_str(&instruction);
                    prompt.push_str("\n\n");
                }
                PromptSection::Facts { header, items } => {
                    prompt.push_str(&format!("{}:\n", header));
                    for (key, value) in items {
                        prompt.push_str(&format!("- {}: {}\n", key, value));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("{}:\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Template(sections) => {
                    prompt.push_str("Please provide your analysis in the following format:\n\n");
                    for (header, guidance) in sections {
                        prompt.push_str(&format!("{}:\n{}\n\n", header, guidance));
                    }
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

/// Preset prompt templates
pub struct PromptTemplates;

impl PromptTemplates {
    /// Render the behavior analysis prompt as of `today`
    pub fn behavior_analysis(
        subject: &SubjectProfile,
        behavior_text: &str,
        context_text: &str,
        has_image: bool,
        today: NaiveDate,
    ) -> String {
        let mut builder = PromptBuilder::new()
            .role(ROLE_INSTRUCTION)
            .facts("Pet Information", subject_facts(subject, today))
            .section("Behavior Description", behavior_text)
            .section("Additional Context", context_text);

        if has_image {
            builder = builder.text(IMAGE_NOTE);
        }

        builder.template(&RESPONSE_SECTIONS).build()
    }

    /// Same as [`Self::behavior_analysis`] using today's UTC date
    pub fn behavior_analysis_now(
        subject: &SubjectProfile,
        behavior_text: &str,
        context_text: &str,
        has_image: bool,
    ) -> String {
        Self::behavior_analysis(
            subject,
            behavior_text,
            context_text,
            has_image,
            Utc::now().date_naive(),
        )
    }
}

fn subject_facts(subject: &SubjectProfile, today: NaiveDate) -> Vec<(String, String)> {
    let mut items = vec![("Species".to_string(), subject.species.clone())];

    if let Some(breed) = &subject.breed {
        items.push(("Breed".to_string(), breed.clone()));
    }
    if let Some(color) = &subject.color_markings {
        items.push(("Color/Markings".to_string(), color.clone()));
    }
    if let (Some(born), Some(age)) = (subject.date_of_birth, subject.age_in_years(today)) {
        items.push(("Age".to_string(), format!("{} years old", age)));
        items.push(("Date of Birth".to_string(), born.format("%Y-%m-%d").to_string()));
    }

    items
}
