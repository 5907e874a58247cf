//! Data models for Fitplan.
//!
//! Profiles arrive as loosely typed [`RawProfile`] values (query strings or
//! JSON bodies) and only become a [`Profile`] after passing through
//! [`crate::validation::normalize`]. Everything downstream of validation works
//! with the typed enums, so an unknown gender or activity level cannot reach
//! the calculator.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use validator::Validate;

/// Biological sex used for the BMR offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    /// Uses the female BMR offset.
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

/// Self-reported activity level, mapped to a TDEE multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise.
    Sedentary,
    /// Light exercise 1-3 days/week.
    Light,
    /// Moderate exercise 3-5 days/week.
    Moderate,
    /// Hard exercise 6-7 days/week.
    Active,
    /// Physical job or twice-daily training.
    VeryActive,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
        }
    }
}

/// What the user wants to do with their body weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Lose,
    Maintain,
    Gain,
}

impl Goal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::Lose => "lose",
            Goal::Maintain => "maintain",
            Goal::Gain => "gain",
        }
    }

    /// Meals per day expected from both the model and the template plans.
    pub fn meals_per_day(&self) -> usize {
        match self {
            Goal::Gain => 4,
            Goal::Lose | Goal::Maintain => 3,
        }
    }
}

/// Error returned when an enum field does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl FromStr for Gender {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" => Ok(ActivityLevel::Light),
            "moderate" => Ok(ActivityLevel::Moderate),
            "active" => Ok(ActivityLevel::Active),
            "very_active" => Ok(ActivityLevel::VeryActive),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

impl FromStr for Goal {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lose" => Ok(Goal::Lose),
            "maintain" => Ok(Goal::Maintain),
            "gain" => Ok(Goal::Gain),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile fields exactly as received from a client, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProfile {
    pub age: i64,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub gender: String,
    pub activity_level: String,
    pub goal: String,
}

/// A validated biometric profile.
///
/// Only [`crate::validation::normalize`] constructs these from client input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
}

/// Energy and macronutrient targets derived from a [`Profile`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroResult {
    /// Basal Metabolic Rate in kcal/day.
    pub bmr: f64,
    /// Total Daily Energy Expenditure in kcal/day.
    pub tdee: f64,
    /// Goal-adjusted daily calories.
    pub calories: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    /// Remainder after protein and fat; not clamped at zero.
    pub carbs_g: f64,
}

/// One meal slot in a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub meal_time: String,
    pub food: String,
}

/// How much of an exercise to do per set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Volume {
    Reps { reps: String },
    Duration { duration: String },
}

/// One exercise in a workout day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    pub name: String,
    pub sets: u32,
    #[serde(flatten)]
    pub volume: Volume,
}

impl ExerciseEntry {
    pub fn reps(name: &str, sets: u32, reps: &str) -> Self {
        Self {
            name: name.to_string(),
            sets,
            volume: Volume::Reps {
                reps: reps.to_string(),
            },
        }
    }

    pub fn timed(name: &str, sets: u32, duration: &str) -> Self {
        Self {
            name: name.to_string(),
            sets,
            volume: Volume::Duration {
                duration: duration.to_string(),
            },
        }
    }
}

/// A day of meals in a template plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealDay {
    pub day: u8,
    pub meals: Vec<MealEntry>,
}

/// A day of exercises in a template plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDay {
    pub day: u8,
    pub exercises: Vec<ExerciseEntry>,
}

/// Plan content returned by the model between the sentinel markers.
///
/// Days are kept exactly as the model wrote them. Models drop `sets` for
/// cardio, quote numbers, and add keys like `calories` or `rest`; all of that
/// is passed through untouched rather than forced into [`MealDay`] and
/// [`WorkoutDay`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanIdeas {
    #[serde(default)]
    pub meal_plan: Vec<Value>,
    #[serde(default)]
    pub workout_plan: Vec<Value>,
}

impl From<TemplatePlan> for PlanIdeas {
    fn from(template: TemplatePlan) -> Self {
        Self {
            meal_plan: template.meal_plan.iter().map(|day| json!(day)).collect(),
            workout_plan: template.workout_plan.iter().map(|day| json!(day)).collect(),
        }
    }
}

/// Full response of the generative endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPlan {
    pub macros: MacroResult,
    pub meal_plan: Vec<Value>,
    pub workout_plan: Vec<Value>,
    pub duration_weeks: u32,
    /// Set when the model output was unusable and a fallback was substituted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Deterministic plan built from fixed templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatePlan {
    pub duration_weeks: u32,
    pub meal_plan: Vec<MealDay>,
    pub workout_plan: Vec<WorkoutDay>,
}

/// Response for POST /plans/calculate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatedPlan {
    #[serde(flatten)]
    pub macros: MacroResult,
    pub meal_plan: Vec<String>,
    pub workout_plan: Vec<String>,
}

/// Standard success envelope used by the generative endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ApiEnvelope<T> {
    pub status: &'static str,
    pub message: String,
    pub data: T,
}

impl<T> ApiEnvelope<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: message.into(),
            data,
        }
    }
}

/// Query parameters for GET /ai/generate.
///
/// Listed flat rather than flattening [`RawProfile`], because query strings
/// carry every value as text and serde's flatten loses the numeric coercion.
#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    pub age: i64,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub gender: String,
    pub activity_level: String,
    pub goal: String,
    /// Optional user id for request logging.
    pub user_id: Option<i64>,
    /// `template` substitutes the template plan when the model fails.
    pub fallback: Option<String>,
}

impl GenerateQuery {
    pub fn raw_profile(&self) -> RawProfile {
        RawProfile {
            age: self.age,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            gender: self.gender.clone(),
            activity_level: self.activity_level.clone(),
            goal: self.goal.clone(),
        }
    }
}

/// Query parameters for GET /plans/template.
#[derive(Debug, Deserialize)]
pub struct TemplateQuery {
    pub goal: String,

    /// Plan duration in weeks (default: 8).
    #[serde(default = "default_weeks")]
    pub weeks: u32,
}

fn default_weeks() -> u32 {
    crate::templates::DEFAULT_DURATION_WEEKS
}

/// Request body for POST /users.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[serde(flatten)]
    pub profile: RawProfile,
}

/// A stored user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
    pub created_at: DateTime<Utc>,
}

/// One row of the append-only model request log.
#[derive(Debug, Clone, Serialize)]
pub struct RequestLogRecord {
    pub id: i64,
    pub user_id: Option<i64>,
    pub request_json: String,
    pub response_json: String,
    pub model_name: String,
    pub created_at: DateTime<Utc>,
}
