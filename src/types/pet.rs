//! Pet identity types
//!
//! Owner and pet identifiers, the explicit session passed to owner-scoped
//! operations, and the subject profile the prompt builder consumes.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::utils::now_rfc3339;

/// Authenticated user identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Pet identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PetId(String);

impl PetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Authenticated session handed explicitly to every owner-scoped call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
        }
    }
}

/// Pet characteristics used to tailor the analysis prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectProfile {
    pub species: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub color_markings: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

impl SubjectProfile {
    pub fn new(species: impl Into<String>) -> Self {
        Self {
            species: species.into(),
            breed: None,
            color_markings: None,
            date_of_birth: None,
        }
    }

    pub fn with_breed(mut self, breed: impl Into<String>) -> Self {
        self.breed = Some(breed.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color_markings = Some(color.into());
        self
    }

    pub fn with_birth_date(mut self, date: NaiveDate) -> Self {
        self.date_of_birth = Some(date);
        self
    }

    /// Whole years elapsed since birth as of `today`, if a birth date is known
    pub fn age_in_years(&self, today: NaiveDate) -> Option<u32> {
        self.date_of_birth.map(|born| whole_years_between(born, today))
    }
}

/// Whole elapsed years; zero when `today` precedes `born`
pub fn whole_years_between(born: NaiveDate, today: NaiveDate) -> u32 {
    if today <= born {
        return 0;
    }
    let mut years = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

/// Pet record stored in the `pets` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: PetId,
    pub owner_id: UserId,
    pub name: String,
    pub species: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Pet {
    /// Create a new pet owned by the session user
    pub fn new(session: &Session, name: impl Into<String>, species: impl Into<String>) -> Self {
        let now = now_rfc3339();
        Self {
            id: PetId::generate(),
            owner_id: session.user_id.clone(),
            name: name.into(),
            species: species.into(),
            breed: None,
            color: None,
            date_of_birth: None,
            photo_url: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Point-in-time snapshot of the characteristics the prompt needs
    pub fn profile(&self) -> SubjectProfile {
        SubjectProfile {
            species: self.species.clone(),
            breed: self.breed.clone(),
            color_markings: self.color.clone(),
            date_of_birth: self.date_of_birth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_whole_years_before_birthday() {
        assert_eq!(whole_years_between(date(2020, 6, 15), date(2024, 6, 14)), 3);
        assert_eq!(whole_years_between(date(2020, 6, 15), date(2024, 6, 15)), 4);
    }

    #[test]
    fn test_whole_years_future_birth_date() {
        assert_eq!(whole_years_between(date(2030, 1, 1), date(2024, 1, 1)), 0);
    }

    #[test]
    fn test_leap_day_birth() {
        assert_eq!(whole_years_between(date(2020, 2, 29), date(2021, 2, 28)), 0);
        assert_eq!(whole_years_between(date(2020, 2, 29), date(2021, 3, 1)), 1);
    }

    #[test]
    fn test_pet_profile_snapshot() {
        let session = Session::new("user-1");
        let mut pet = Pet::new(&session, "Rex", "Dog");
        pet.breed = Some("Beagle".to_string());
        pet.date_of_birth = Some(date(2019, 3, 2));

        let profile = pet.profile();
        assert_eq!(profile.species, "Dog");
        assert_eq!(profile.breed.as_deref(), Some("Beagle"));
        assert_eq!(profile.color_markings, None);
        assert_eq!(profile.age_in_years(date(2024, 3, 1)), Some(4));
    }

    #[test]
    fn test_pet_serializes_camel_case() {
        let pet = Pet::new(&Session::new("u"), "Tom", "Cat");
        let json = serde_json::to_value(&pet).unwrap();
        assert_eq!(json["ownerId"], "u");
        assert!(json.get("breed").is_none());
    }
}
