use serde::Deserialize;

use super::repo_types::{NewDistrict, NewState};
use crate::error::{AppError, AppResult, FieldErrors};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatePayload {
    pub name: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DistrictPayload {
    pub state: Option<i64>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DistrictQuery {
    pub state: Option<i64>,
}

fn required_name(errors: &mut FieldErrors, v: Option<String>) -> String {
    match v.map(|s| s.trim().to_string()) {
        None => {
            errors.insert("name".into(), vec!["This field is required.".into()]);
            String::new()
        }
        Some(s) if s.is_empty() => {
            errors.insert("name".into(), vec!["This field may not be blank.".into()]);
            s
        }
        Some(s) => s,
    }
}

impl StatePayload {
    pub fn validate(self) -> AppResult<NewState> {
        let mut errors = FieldErrors::new();
        let name = required_name(&mut errors, self.name);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(NewState {
            name,
            code: self.code.map(|c| c.trim().to_uppercase()).unwrap_or_default(),
        })
    }
}

impl DistrictPayload {
    pub fn validate(self) -> AppResult<NewDistrict> {
        let mut errors = FieldErrors::new();
        if self.state.is_none() {
            errors.insert("state".into(), vec!["This field is required.".into()]);
        }
        let name = required_name(&mut errors, self.name);
        match self.state {
            Some(state) if errors.is_empty() => Ok(NewDistrict { state, name }),
            _ => Err(AppError::Validation(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_code_is_normalised() {
        let new = StatePayload { name: Some(" Kerala ".into()), code: Some("kl".into()) }
            .validate()
            .unwrap();
        assert_eq!(new, NewState { name: "Kerala".into(), code: "KL".into() });
    }

    #[test]
    fn district_needs_state_and_name() {
        match DistrictPayload::default().validate() {
            Err(AppError::Validation(e)) => {
                assert!(e.contains_key("state"));
                assert!(e.contains_key("name"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn blank_district_name_is_rejected() {
        let res = DistrictPayload { state: Some(1), name: Some("   ".into()) }.validate();
        assert!(matches!(res, Err(AppError::Validation(e)) if e["name"][0].contains("blank")));
    }
}
