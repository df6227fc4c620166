//! Point commands: list, edit and delete stored visits.

use anyhow::Result;
use housemap_core::{App, PointEdit, PointId, UserPrompt};

use crate::commands::format_points;
use crate::error::CliError;

pub fn list(app: &App) -> Result<()> {
    let points = app.points().list().map_err(CliError::from)?;
    println!("{}", format_points(&points));
    log::info!("Listed {} points", points.len());
    Ok(())
}

/// Apply street and/or number changes to one point. An empty value clears
/// the field.
pub fn edit<P: UserPrompt>(
    app: &App,
    prompt: P,
    id: PointId,
    street: Option<String>,
    number: Option<String>,
) -> Result<()> {
    if street.is_none() && number.is_none() {
        println!("Nothing to change; pass --street and/or --number.");
        return Ok(());
    }

    let mut list = app.list_surface(prompt);
    list.activate().map_err(CliError::from)?;
    if let Some(street) = street {
        list.edit(id, PointEdit::Street(street)).map_err(CliError::from)?;
    }
    if let Some(number) = number {
        list.edit(id, PointEdit::Number(number)).map_err(CliError::from)?;
    }

    let updated: Vec<_> = list.points().iter().filter(|p| p.id == id).cloned().collect();
    println!("{}", format_points(&updated));
    Ok(())
}

pub fn delete<P: UserPrompt>(app: &App, prompt: P, id: PointId) -> Result<()> {
    let mut list = app.list_surface(prompt);
    list.activate().map_err(CliError::from)?;
    if !list.points().iter().any(|p| p.id == id) {
        return Err(CliError::point_not_found(id).into());
    }

    if list.delete(id).map_err(CliError::from)? {
        println!("Deleted point {}", id);
    } else {
        println!("Kept point {}", id);
    }
    Ok(())
}
