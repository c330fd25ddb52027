//! Catalog Commands
//!
//! Species lookups for vaccines and activity types.

use crate::catalog::{activity_types_for, vaccines_for};
use crate::cli::commands::ListFormat;
use crate::cli::ui::Output;
use crate::types::Result;

pub fn vaccines(species: &str, format: ListFormat) -> Result<()> {
    let vaccines = vaccines_for(species);

    if format == ListFormat::Json {
        println!("{}", serde_json::to_string_pretty(&vaccines)?);
        return Ok(());
    }

    let output = Output::new();
    if vaccines.is_empty() {
        output.warning(&format!("No vaccines listed for {}", species));
        return Ok(());
    }

    output.header(&format!("Vaccines for {}", species));
    for vaccine in vaccines {
        output.item(
            &format!("{} [{}]", vaccine.name, vaccine.kind),
            Some(vaccine.description),
        );
    }
    Ok(())
}

pub fn activities(species: &str, format: ListFormat) -> Result<()> {
    let activities = activity_types_for(species);

    if format == ListFormat::Json {
        println!("{}", serde_json::to_string_pretty(&activities)?);
        return Ok(());
    }

    let output = Output::new();
    if activities.is_empty() {
        output.warning(&format!("No activity types listed for {}", species));
        return Ok(());
    }

    output.header(&format!("Activities for {}", species));
    for activity in activities {
        output.item(activity.label, Some(activity.id));
    }
    Ok(())
}
