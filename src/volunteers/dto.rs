use serde::Deserialize;
use time::Date;
use uuid::Uuid;

use super::repo_types::{
    Designation, Level, NewDesignation, NewLevel, NewVolunteer, NewWing, Volunteer, Wing,
};
use crate::error::{AppError, AppResult, FieldErrors};

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

fn require<T>(errors: &mut FieldErrors, field: &str, v: Option<T>) -> Option<T> {
    if v.is_none() {
        errors.entry(field.to_string()).or_default().push(REQUIRED.into());
    }
    v
}

fn non_blank(errors: &mut FieldErrors, field: &str, v: Option<String>) -> Option<String> {
    let v = v.map(|s| s.trim().to_string());
    if matches!(&v, Some(s) if s.is_empty()) {
        errors.entry(field.to_string()).or_default().push(BLANK.into());
        return None;
    }
    v
}

fn finish<T>(errors: FieldErrors, value: impl FnOnce() -> T) -> AppResult<T> {
    if errors.is_empty() {
        Ok(value())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Body for wing create/update. POST and PUT need every required field;
/// PATCH fills gaps from the stored row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WingPayload {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl WingPayload {
    pub fn merge(self, current: Option<&Wing>) -> AppResult<NewWing> {
        let mut errors = FieldErrors::new();
        let name = non_blank(&mut errors, "name", self.name).or(current.map(|c| c.name.clone()));
        let name = require(&mut errors, "name", name);
        let description = self
            .description
            .or(current.map(|c| c.description.clone()))
            .unwrap_or_default();
        finish(errors, || NewWing {
            name: name.unwrap_or_default(),
            description,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LevelPayload {
    pub wing: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl LevelPayload {
    pub fn merge(self, current: Option<&Level>) -> AppResult<NewLevel> {
        let mut errors = FieldErrors::new();
        let wing = require(&mut errors, "wing", self.wing.or(current.map(|c| c.wing)));
        let name = non_blank(&mut errors, "name", self.name).or(current.map(|c| c.name.clone()));
        let name = require(&mut errors, "name", name);
        let description = self
            .description
            .or(current.map(|c| c.description.clone()))
            .unwrap_or_default();
        finish(errors, || NewLevel {
            wing: wing.unwrap_or_default(),
            name: name.unwrap_or_default(),
            description,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DesignationPayload {
    pub level: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl DesignationPayload {
    pub fn merge(self, current: Option<&Designation>) -> AppResult<NewDesignation> {
        let mut errors = FieldErrors::new();
        let level = require(&mut errors, "level", self.level.or(current.map(|c| c.level)));
        let title =
            non_blank(&mut errors, "title", self.title).or(current.map(|c| c.title.clone()));
        let title = require(&mut errors, "title", title);
        let description = self
            .description
            .or(current.map(|c| c.description.clone()))
            .unwrap_or_default();
        finish(errors, || NewDesignation {
            level: level.unwrap_or_default(),
            title: title.unwrap_or_default(),
            description,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VolunteerPayload {
    pub user: Option<Uuid>,
    pub wing: Option<i64>,
    pub level: Option<i64>,
    pub designation: Option<i64>,
    pub phone_number: Option<String>,
    pub joined_date: Option<Date>,
    pub is_active: Option<bool>,
}

impl VolunteerPayload {
    /// `today` fills a missing `joined_date` on create.
    pub fn merge(self, current: Option<&Volunteer>, today: Date) -> AppResult<NewVolunteer> {
        let mut errors = FieldErrors::new();
        let user = require(&mut errors, "user", self.user.or(current.map(|c| c.user)));
        let wing = require(&mut errors, "wing", self.wing.or(current.map(|c| c.wing)));
        let level = require(&mut errors, "level", self.level.or(current.map(|c| c.level)));
        let designation = require(
            &mut errors,
            "designation",
            self.designation.or(current.map(|c| c.designation)),
        );
        let phone_number = self
            .phone_number
            .map(|p| p.trim().to_string())
            .or(current.map(|c| c.phone_number.clone()))
            .unwrap_or_default();
        let joined_date = self
            .joined_date
            .or(current.map(|c| c.joined_date))
            .unwrap_or(today);
        let is_active = self.is_active.or(current.map(|c| c.is_active)).unwrap_or(true);
        finish(errors, || NewVolunteer {
            user: user.unwrap_or_default(),
            wing: wing.unwrap_or_default(),
            level: level.unwrap_or_default(),
            designation: designation.unwrap_or_default(),
            phone_number,
            joined_date,
            is_active,
        })
    }
}
