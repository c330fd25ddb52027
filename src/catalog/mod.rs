//! Static species catalogs
//!
//! Species names match exactly on their capitalized form (`Dog`, `Cat`, ...).

mod activities;
mod vaccines;

pub use activities::{ACTIVITY_TYPES, ActivityType, activity_types_for};
pub use vaccines::{VACCINES, Vaccine, VaccineKind, vaccines_for};
