//! Referential checks for the wing > level > designation chain.

use sqlx::PgPool;
use tracing::debug;

use super::repo_types::{Designation, Level, NewDesignation, NewLevel, NewVolunteer, Wing};
use crate::{
    accounts::repo_types::User,
    error::{AppError, AppResult, FieldErrors},
};

pub const LEVEL_IN_USE: &str = "Level is held by volunteers of its current wing.";
pub const DESIGNATION_IN_USE: &str = "Designation is held by volunteers of its current level.";

pub fn missing_pk(id: impl std::fmt::Display) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}

fn push(errors: &mut FieldErrors, field: &str, msg: String) {
    errors.entry(field.to_string()).or_default().push(msg);
}

fn into_result(errors: FieldErrors) -> AppResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// `id` is the row being updated, `None` on create.
pub async fn check_level_refs(db: &PgPool, id: Option<i64>, new: &NewLevel) -> AppResult<()> {
    if Wing::find(db, new.wing).await?.is_none() {
        return Err(AppError::field("wing", missing_pk(new.wing)));
    }
    if let Some(id) = id {
        if Level::held_outside_wing(db, id, new.wing).await? {
            return Err(AppError::field("wing", LEVEL_IN_USE));
        }
    }
    Ok(())
}

pub async fn check_designation_refs(
    db: &PgPool,
    id: Option<i64>,
    new: &NewDesignation,
) -> AppResult<()> {
    if Level::find(db, new.level).await?.is_none() {
        return Err(AppError::field("level", missing_pk(new.level)));
    }
    if let Some(id) = id {
        if Designation::held_outside_level(db, id, new.level).await? {
            return Err(AppError::field("level", DESIGNATION_IN_USE));
        }
    }
    Ok(())
}

/// What the database returned for each reference of a volunteer row.
pub struct VolunteerRefs {
    pub user_exists: bool,
    pub wing_exists: bool,
    pub level: Option<Level>,
    pub designation: Option<Designation>,
}

/// A volunteer's level must sit under its wing and its designation under its level.
pub fn containment_errors(new: &NewVolunteer, refs: &VolunteerRefs) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if !refs.user_exists {
        push(&mut errors, "user", missing_pk(new.user));
    }
    if !refs.wing_exists {
        push(&mut errors, "wing", missing_pk(new.wing));
    }
    match &refs.level {
        None => push(&mut errors, "level", missing_pk(new.level)),
        Some(level) if refs.wing_exists && level.wing != new.wing => push(
            &mut errors,
            "level",
            "Level does not belong to the selected wing.".into(),
        ),
        Some(_) => {}
    }
    match &refs.designation {
        None => push(&mut errors, "designation", missing_pk(new.designation)),
        Some(d) if refs.level.is_some() && d.level != new.level => push(
            &mut errors,
            "designation",
            "Designation does not belong to the selected level.".into(),
        ),
        Some(_) => {}
    }
    errors
}

pub async fn check_volunteer_refs(db: &PgPool, new: &NewVolunteer) -> AppResult<()> {
    let refs = VolunteerRefs {
        user_exists: User::find_by_id(db, new.user).await?.is_some(),
        wing_exists: Wing::find(db, new.wing).await?.is_some(),
        level: Level::find(db, new.level).await?,
        designation: Designation::find(db, new.designation).await?,
    };
    let errors = containment_errors(new, &refs);
    if !errors.is_empty() {
        debug!(?errors, "volunteer references rejected");
    }
    into_result(errors)
}

#[cfg(test)]
mod tests {
    use time::macros::date;
    use uuid::Uuid;

    use super::*;

    fn volunteer() -> NewVolunteer {
        NewVolunteer {
            user: Uuid::nil(),
            wing: 1,
            level: 10,
            designation: 100,
            phone_number: String::new(),
            joined_date: date!(2024 - 01 - 15),
            is_active: true,
        }
    }

    fn level(wing: i64) -> Level {
        Level { id: 10, wing, name: "District".into(), description: String::new() }
    }

    fn designation(level: i64) -> Designation {
        Designation { id: 100, level, title: "Secretary".into(), description: String::new() }
    }

    #[test]
    fn consistent_chain_passes() {
        let refs = VolunteerRefs {
            user_exists: true,
            wing_exists: true,
            level: Some(level(1)),
            designation: Some(designation(10)),
        };
        assert!(containment_errors(&volunteer(), &refs).is_empty());
    }

    #[test]
    fn level_from_another_wing_is_rejected() {
        let refs = VolunteerRefs {
            user_exists: true,
            wing_exists: true,
            level: Some(level(2)),
            designation: Some(designation(10)),
        };
        let errors = containment_errors(&volunteer(), &refs);
        assert_eq!(errors.len(), 1);
        assert!(errors["level"][0].contains("selected wing"));
    }

    #[test]
    fn designation_from_another_level_is_rejected() {
        let refs = VolunteerRefs {
            user_exists: true,
            wing_exists: true,
            level: Some(level(1)),
            designation: Some(designation(11)),
        };
        let errors = containment_errors(&volunteer(), &refs);
        assert!(errors["designation"][0].contains("selected level"));
    }

    #[test]
    fn missing_rows_report_invalid_pk() {
        let refs = VolunteerRefs {
            user_exists: false,
            wing_exists: false,
            level: None,
            designation: None,
        };
        let errors = containment_errors(&volunteer(), &refs);
        assert_eq!(errors["wing"], vec![missing_pk(1)]);
        assert_eq!(errors["level"], vec![missing_pk(10)]);
        assert_eq!(errors["designation"], vec![missing_pk(100)]);
        assert!(errors.contains_key("user"));
    }
}
