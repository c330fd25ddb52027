//! Activity types per species

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityType {
    pub id: &'static str,
    pub label: &'static str,
    pub available_for: &'static [&'static str],
}

const EVERY_SPECIES: &[&str] = &[
    "Dog", "Cat", "Bird", "Fish", "Reptile", "Cow", "Horse", "Elephant", "Others",
];

pub const ACTIVITY_TYPES: &[ActivityType] = &[
    ActivityType {
        id: "walk",
        label: "Walk",
        available_for: &["Dog", "Cat", "Horse", "Elephant"],
    },
    ActivityType {
        id: "training",
        label: "Training",
        available_for: &["Dog", "Cat", "Horse", "Bird", "Elephant"],
    },
    ActivityType {
        id: "playtime",
        label: "Playtime",
        available_for: &["Dog", "Cat", "Bird", "Reptile", "Horse", "Elephant"],
    },
    ActivityType {
        id: "grooming",
        label: "Grooming",
        available_for: &["Dog", "Cat", "Horse", "Cow", "Elephant", "Bird"],
    },
    ActivityType {
        id: "feeding",
        label: "Feeding",
        available_for: EVERY_SPECIES,
    },
    ActivityType {
        id: "medication",
        label: "Medication",
        available_for: EVERY_SPECIES,
    },
    ActivityType {
        id: "vet_visit",
        label: "Vet Visit",
        available_for: EVERY_SPECIES,
    },
    ActivityType {
        id: "tank_cleaning",
        label: "Tank Cleaning",
        available_for: &["Fish"],
    },
    ActivityType {
        id: "water_change",
        label: "Water Change",
        available_for: &["Fish"],
    },
    ActivityType {
        id: "other",
        label: "Other",
        available_for: EVERY_SPECIES,
    },
];

/// Activity types offered for a species, in catalog order
pub fn activity_types_for(species: &str) -> Vec<&'static ActivityType> {
    ACTIVITY_TYPES
        .iter()
        .filter(|a| a.available_for.contains(&species))
        .collect()
}
