//! Vaccine catalog per species

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VaccineKind {
    Core,
    NonCore,
}

impl std::fmt::Display for VaccineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Core => write!(f, "core"),
            Self::NonCore => write!(f, "non-core"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Vaccine {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub kind: VaccineKind,
    pub species: &'static str,
}

const fn vaccine(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    kind: VaccineKind,
    species: &'static str,
) -> Vaccine {
    Vaccine {
        id,
        name,
        description,
        kind,
        species,
    }
}

pub const VACCINES: &[Vaccine] = &[
    // Dog
    vaccine("dog_rabies", "Rabies", "Protects against the fatal rabies virus", VaccineKind::Core, "Dog"),
    vaccine("dog_distemper", "Canine Distemper", "Guards against a severe and often fatal viral disease", VaccineKind::Core, "Dog"),
    vaccine("dog_adenovirus", "Canine Adenovirus (Hepatitis)", "Prevents infectious canine hepatitis", VaccineKind::Core, "Dog"),
    vaccine("dog_parvovirus", "Canine Parvovirus", "Shields against a highly contagious and potentially deadly virus", VaccineKind::Core, "Dog"),
    vaccine("dog_bordetella", "Bordetella bronchiseptica (Kennel Cough)", "Protects against a common cause of kennel cough", VaccineKind::NonCore, "Dog"),
    vaccine("dog_leptospirosis", "Leptospirosis", "Guards against a bacterial infection that can affect both dogs and humans", VaccineKind::NonCore, "Dog"),
    vaccine("dog_lyme", "Lyme Disease", "Prevents Lyme disease transmitted by ticks", VaccineKind::NonCore, "Dog"),
    vaccine("dog_influenza", "Canine Influenza", "Protects against canine flu viruses", VaccineKind::NonCore, "Dog"),
    vaccine("dog_parainfluenza", "Canine Parainfluenza", "Helps prevent respiratory infections", VaccineKind::NonCore, "Dog"),

    // Cat
    vaccine("cat_rabies", "Rabies", "Protects against the fatal rabies virus", VaccineKind::Core, "Cat"),
    vaccine("cat_herpesvirus", "Feline Herpesvirus (Rhinotracheitis)", "Prevents respiratory infections", VaccineKind::Core, "Cat"),
    vaccine("cat_calicivirus", "Feline Calicivirus", "Guards against a common respiratory virus", VaccineKind::Core, "Cat"),
    vaccine("cat_panleukopenia", "Feline Panleukopenia (Distemper)", "Shields against a severe and often fatal disease", VaccineKind::Core, "Cat"),
    vaccine("cat_felv", "Feline Leukemia Virus (FeLV)", "Protects against a serious viral infection", VaccineKind::NonCore, "Cat"),
    vaccine("cat_chlamydophila", "Chlamydophila felis", "Prevents conjunctivitis and respiratory issues", VaccineKind::NonCore, "Cat"),
    vaccine("cat_bordetella", "Bordetella bronchiseptica", "Guards against respiratory infections", VaccineKind::NonCore, "Cat"),
    vaccine("cat_fiv", "Feline Immunodeficiency Virus (FIV)", "Protects against an immune system-affecting virus", VaccineKind::NonCore, "Cat"),
    vaccine("cat_fip", "Feline Infectious Peritonitis (FIP)", "Generally experimental and not widely used", VaccineKind::NonCore, "Cat"),

    // Bird
    vaccine("bird_newcastle", "Newcastle Disease", "Protects against a highly contagious viral disease in poultry", VaccineKind::Core, "Bird"),
    vaccine("bird_influenza", "Avian Influenza", "Guards against various strains of bird flu", VaccineKind::Core, "Bird"),
    vaccine("bird_polyomavirus", "Polyomavirus", "Prevents polyomavirus infections", VaccineKind::NonCore, "Bird"),
    vaccine("bird_mareks", "Marek's Disease", "Protects against a viral disease affecting poultry", VaccineKind::NonCore, "Bird"),

    // Fish
    vaccine("fish_vibriosis", "Vibriosis", "Protect against Vibrio species", VaccineKind::Core, "Fish"),
    vaccine("fish_ihnv", "Infectious Hematopoietic Necrosis Virus (IHNV)", "Guards against a viral infection in salmonids", VaccineKind::Core, "Fish"),
    vaccine("fish_khv", "Koi Herpesvirus (KHV)", "Prevents herpesvirus in koi and common carp", VaccineKind::Core, "Fish"),
    vaccine("fish_columnaris", "Flavobacterium columnaris", "Protects against columnaris disease", VaccineKind::NonCore, "Fish"),
    vaccine("fish_furunculosis", "Aeromonas salmonicida (Furunculosis)", "Shields against furunculosis in salmonids", VaccineKind::NonCore, "Fish"),

    // Cow
    vaccine("cow_rabies", "Rabies", "Protects against the fatal rabies virus", VaccineKind::Core, "Cow"),
    vaccine("cow_bvd", "Bovine Viral Diarrhea (BVD)", "Guards against a viral infection affecting multiple body systems", VaccineKind::Core, "Cow"),
    vaccine("cow_brsv", "Bovine Respiratory Syncytial Virus (BRSV)", "Prevents respiratory infections", VaccineKind::Core, "Cow"),
    vaccine("cow_ibr", "Infectious Bovine Rhinotracheitis (IBR)", "Shields against a respiratory disease", VaccineKind::Core, "Cow"),
    vaccine("cow_pi3", "Parainfluenza-3 (PI-3)", "Protects against a viral respiratory pathogen", VaccineKind::Core, "Cow"),
    vaccine("cow_fmd", "Foot-and-Mouth Disease (FMD)", "Prevents a severe viral disease affecting cloven-hoofed animals", VaccineKind::Core, "Cow"),
    vaccine("cow_lepto", "Leptospirosis", "Guards against a bacterial infection affecting kidneys and liver", VaccineKind::Core, "Cow"),
    vaccine("cow_clostridial", "Clostridial Vaccines", "Protect against various bacterial toxins", VaccineKind::Core, "Cow"),
    vaccine("cow_brucellosis", "Brucellosis", "Protects against a bacterial infection, varies by region", VaccineKind::NonCore, "Cow"),
    vaccine("cow_anthrax", "Anthrax", "Prevents a serious bacterial disease", VaccineKind::NonCore, "Cow"),
    vaccine("cow_mannheimia", "Mannheimia haemolytica", "Guards against respiratory infections", VaccineKind::NonCore, "Cow"),
    vaccine("cow_tb", "Mycobacterium bovis (TB Control)", "Used in specific regions for tuberculosis control", VaccineKind::NonCore, "Cow"),

    // Horse
    vaccine("horse_rabies", "Rabies", "Protects against the fatal rabies virus", VaccineKind::Core, "Horse"),
    vaccine("horse_tetanus", "Tetanus", "Guards against the toxin-producing bacterium Clostridium tetani", VaccineKind::Core, "Horse"),
    vaccine("horse_eee_wee", "Eastern and Western Equine Encephalomyelitis", "Prevents viral infections causing encephalitis", VaccineKind::Core, "Horse"),
    vaccine("horse_wnv", "West Nile Virus", "Shields against a mosquito-borne viral disease", VaccineKind::Core, "Horse"),
    vaccine("horse_influenza", "Influenza", "Protects against equine influenza viruses", VaccineKind::Core, "Horse"),
    vaccine("horse_eia", "Equine Infectious Anemia (EIA)", "Prevents a viral blood disease", VaccineKind::NonCore, "Horse"),
    vaccine("horse_strangles", "Strangles (Streptococcus equi)", "Guards against a highly contagious bacterial infection", VaccineKind::NonCore, "Horse"),
    vaccine("horse_phf", "Potomac Horse Fever", "Protects against an intestinal bacterial disease", VaccineKind::NonCore, "Horse"),
    vaccine("horse_rhino", "Rhinopneumonitis (Equine Herpesvirus)", "Prevents respiratory and neurological infections", VaccineKind::NonCore, "Horse"),
    vaccine("horse_botulism", "Botulism Toxoid", "Shields against botulism poisoning", VaccineKind::NonCore, "Horse"),
    vaccine("horse_rotavirus", "Rotavirus", "Protects foals against viral diarrhea", VaccineKind::NonCore, "Horse"),

    // Elephant
    vaccine("elephant_anthrax", "Anthrax", "Protects against Bacillus anthracis infection", VaccineKind::Core, "Elephant"),
    vaccine("elephant_tb", "Tuberculosis", "Experimental approaches for TB prevention", VaccineKind::NonCore, "Elephant"),
    vaccine("elephant_eehv", "Elephant Endotheliotropic Herpesvirus (EEHV)", "No widely available vaccine; research ongoing", VaccineKind::NonCore, "Elephant"),
];

/// Vaccines for a species: core first, then by name (case-insensitive)
pub fn vaccines_for(species: &str) -> Vec<&'static Vaccine> {
    let mut found: Vec<&'static Vaccine> =
        VACCINES.iter().filter(|v| v.species == species).collect();

    found.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_before_non_core() {
        let dog = vaccines_for("Dog");
        assert_eq!(dog.len(), 9);

        let first_non_core = dog
            .iter()
            .position(|v| v.kind == VaccineKind::NonCore)
            .unwrap();
        assert!(dog[..first_non_core].iter().all(|v| v.kind == VaccineKind::Core));
        assert!(dog[first_non_core..].iter().all(|v| v.kind == VaccineKind::NonCore));
    }

    #[test]
    fn test_sorted_by_name_within_kind() {
        let names: Vec<&str> = vaccines_for("Cat")
            .iter()
            .filter(|v| v.kind == VaccineKind::Core)
            .map(|v| v.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "Feline Calicivirus",
                "Feline Herpesvirus (Rhinotracheitis)",
                "Feline Panleukopenia (Distemper)",
                "Rabies",
            ]
        );
    }

    #[test]
    fn test_species_match_is_exact() {
        assert!(vaccines_for("dog").is_empty());
        assert!(vaccines_for("Reptile").is_empty());
        assert_eq!(vaccines_for("Elephant").len(), 3);
    }

    #[test]
    fn test_ids_unique() {
        let mut ids: Vec<&str> = VACCINES.iter().map(|v| v.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), VACCINES.len());
    }
}
