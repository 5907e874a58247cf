//! Profile normalization and validation.
//!
//! Every field is checked before anything is computed from it. The first
//! offending field fails the whole profile; no partially built [`Profile`] is
//! ever returned.

use thiserror::Error;
use validator::Validate;

use crate::model::{ActivityLevel, CreateUserRequest, Gender, Goal, Profile, RawProfile};

pub const MIN_AGE: i64 = 10;
pub const MAX_AGE: i64 = 100;

/// Exclusive bounds in centimetres.
pub const HEIGHT_CM_BOUNDS: (f64, f64) = (50.0, 250.0);

/// Exclusive bounds in kilograms.
pub const WEIGHT_KG_BOUNDS: (f64, f64) = (20.0, 300.0);

/// A profile field that failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid age {0}. Must be between 10 and 100.")]
    Age(i64),

    #[error("Invalid height_cm {0}. Must be greater than 50 and less than 250.")]
    Height(f64),

    #[error("Invalid weight_kg {0}. Must be greater than 20 and less than 300.")]
    Weight(f64),

    #[error("Invalid gender '{0}'. Must be: male, female, or other.")]
    Gender(String),

    #[error(
        "Invalid activity level '{0}'. Must be: sedentary, light, moderate, active, or very_active."
    )]
    ActivityLevel(String),

    #[error("Invalid goal '{0}'. Must be: lose, maintain, or gain.")]
    Goal(String),

    #[error("Invalid email '{0}'. Must be a valid email address.")]
    Email(String),

    #[error("Invalid weeks {0}. Must be at least 1.")]
    Weeks(u32),

    #[error("{0}")]
    Field(String),
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Age(_) => "age",
            ValidationError::Height(_) => "height_cm",
            ValidationError::Weight(_) => "weight_kg",
            ValidationError::Gender(_) => "gender",
            ValidationError::ActivityLevel(_) => "activity_level",
            ValidationError::Goal(_) => "goal",
            ValidationError::Email(_) => "email",
            ValidationError::Weeks(_) => "weeks",
            ValidationError::Field(_) => "request",
        }
    }
}

/// Validate a raw profile and convert it into its typed form.
///
/// Enum fields are trimmed and matched case-insensitively, so `"Male"` and
/// `"GAIN"` are accepted.
pub fn normalize(raw: &RawProfile) -> Result<Profile, ValidationError> {
    if !(MIN_AGE..=MAX_AGE).contains(&raw.age) {
        return Err(ValidationError::Age(raw.age));
    }
    if !within_exclusive(raw.height_cm, HEIGHT_CM_BOUNDS) {
        return Err(ValidationError::Height(raw.height_cm));
    }
    if !within_exclusive(raw.weight_kg, WEIGHT_KG_BOUNDS) {
        return Err(ValidationError::Weight(raw.weight_kg));
    }

    let gender = parse_enum_field::<Gender>(&raw.gender).map_err(ValidationError::Gender)?;
    let activity_level = parse_enum_field::<ActivityLevel>(&raw.activity_level)
        .map_err(ValidationError::ActivityLevel)?;
    let goal = parse_enum_field::<Goal>(&raw.goal).map_err(ValidationError::Goal)?;

    Ok(Profile {
        // Range-checked above.
        age: raw.age as u32,
        height_cm: raw.height_cm,
        weight_kg: raw.weight_kg,
        gender,
        activity_level,
        goal,
    })
}

/// Parse a goal name on its own, for endpoints that take only a goal.
pub fn parse_goal(raw: &str) -> Result<Goal, ValidationError> {
    parse_enum_field::<Goal>(raw).map_err(ValidationError::Goal)
}

/// Plan duration requested by a client; zero weeks is not a plan.
pub fn duration_weeks(weeks: u32) -> Result<u32, ValidationError> {
    if weeks == 0 {
        return Err(ValidationError::Weeks(weeks));
    }
    Ok(weeks)
}

/// Check a registration: email first, then the profile.
pub fn user_profile(request: &CreateUserRequest) -> Result<Profile, ValidationError> {
    request
        .validate()
        .map_err(|_| ValidationError::Email(request.email.clone()))?;
    normalize(&request.profile)
}

fn parse_enum_field<T: std::str::FromStr>(raw: &str) -> Result<T, String> {
    raw.parse::<T>().map_err(|_| raw.to_string())
}

/// NaN and infinities fail every comparison, so they are rejected here too.
fn within_exclusive(value: f64, (low, high): (f64, f64)) -> bool {
    value > low && value < high
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawProfile {
        RawProfile {
            age: 25,
            height_cm: 175.0,
            weight_kg: 70.0,
            gender: "male".to_string(),
            activity_level: "moderate".to_string(),
            goal: "gain".to_string(),
        }
    }

    #[test]
    fn test_accepts_case_insensitive_enums() {
        let profile = normalize(&RawProfile {
            gender: "Male".to_string(),
            activity_level: "Very_Active".to_string(),
            goal: "GAIN".to_string(),
            ..raw()
        })
        .unwrap();

        assert_eq!(profile.gender, Gender::Male);
        assert_eq!(profile.activity_level, ActivityLevel::VeryActive);
        assert_eq!(profile.goal, Goal::Gain);
        assert_eq!(profile.age, 25);
    }

    #[test]
    fn test_rejects_unknown_enums() {
        let gender = normalize(&RawProfile {
            gender: "xyz".to_string(),
            ..raw()
        });
        assert_eq!(gender, Err(ValidationError::Gender("xyz".to_string())));

        let activity = normalize(&RawProfile {
            activity_level: "extreme".to_string(),
            ..raw()
        });
        assert_eq!(
            activity,
            Err(ValidationError::ActivityLevel("extreme".to_string()))
        );

        let goal = normalize(&RawProfile {
            goal: "bulk".to_string(),
            ..raw()
        });
        assert_eq!(goal.unwrap_err().field(), "goal");
    }

    #[test]
    fn test_age_bounds_are_inclusive() {
        assert!(normalize(&RawProfile { age: 10, ..raw() }).is_ok());
        assert!(normalize(&RawProfile { age: 100, ..raw() }).is_ok());
        assert_eq!(
            normalize(&RawProfile { age: 9, ..raw() }),
            Err(ValidationError::Age(9))
        );
        assert_eq!(
            normalize(&RawProfile { age: 0, ..raw() }),
            Err(ValidationError::Age(0))
        );
    }

    #[test]
    fn test_height_and_weight_bounds_are_exclusive() {
        let at_min_height = normalize(&RawProfile {
            height_cm: 50.0,
            ..raw()
        });
        assert_eq!(at_min_height.unwrap_err().field(), "height_cm");

        let at_max_weight = normalize(&RawProfile {
            weight_kg: 300.0,
            ..raw()
        });
        assert_eq!(at_max_weight.unwrap_err().field(), "weight_kg");

        assert!(
            normalize(&RawProfile {
                height_cm: 50.5,
                weight_kg: 20.5,
                ..raw()
            })
            .is_ok()
        );
    }

    #[test]
    fn test_rejects_non_finite_numbers() {
        let nan = normalize(&RawProfile {
            weight_kg: f64::NAN,
            ..raw()
        });
        assert_eq!(nan.unwrap_err().field(), "weight_kg");

        let inf = normalize(&RawProfile {
            height_cm: f64::INFINITY,
            ..raw()
        });
        assert_eq!(inf.unwrap_err().field(), "height_cm");
    }

    #[test]
    fn test_numeric_fields_checked_before_enums() {
        let err = normalize(&RawProfile {
            age: 5,
            gender: "xyz".to_string(),
            ..raw()
        })
        .unwrap_err();
        assert_eq!(err.field(), "age");
    }

    #[test]
    fn test_error_messages_name_the_field() {
        let err = normalize(&RawProfile {
            goal: "bulk".to_string(),
            ..raw()
        })
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid goal 'bulk'. Must be: lose, maintain, or gain."
        );
    }

    #[test]
    fn test_zero_weeks_rejected() {
        assert_eq!(duration_weeks(12), Ok(12));
        let err = duration_weeks(0).unwrap_err();
        assert_eq!(err, ValidationError::Weeks(0));
        assert_eq!(err.field(), "weeks");
    }

    #[test]
    fn test_user_email_checked_before_profile() {
        let request = CreateUserRequest {
            email: "not-an-email".to_string(),
            profile: RawProfile { age: 5, ..raw() },
        };
        let err = user_profile(&request).unwrap_err();
        assert_eq!(err.field(), "email");
        assert_eq!(
            err.to_string(),
            "Invalid email 'not-an-email'. Must be a valid email address."
        );

        let request = CreateUserRequest {
            email: "a@example.com".to_string(),
            ..request
        };
        assert_eq!(user_profile(&request).unwrap_err().field(), "age");
    }
}
