//! Calorie and macronutrient targets.
//!
//! # Formulas
//!
//! - BMR: Mifflin-St Jeor, `10*kg + 6.25*cm - 5*age + 5` for men and `- 161`
//!   for women. Profiles with gender `other` use the female offset.
//! - TDEE: BMR times a fixed activity multiplier.
//! - Calories: TDEE minus 500 to lose, plus 500 to gain, unchanged to maintain.
//! - Protein: 2.2 g/kg to lose, 2.0 g/kg to gain, 1.8 g/kg to maintain.
//! - Fat: 25% of calories at 9 kcal/g.
//! - Carbs: whatever calories remain at 4 kcal/g. Not clamped, so extreme
//!   low-calorie profiles can produce a negative value.
//!
//! Everything here works on unrounded values; [`MacroResult::rounded`] is for
//! display only.

use crate::model::{ActivityLevel, Gender, Goal, MacroResult, Profile};

/// Daily calorie offset applied for the lose and gain goals.
pub const GOAL_CALORIE_DELTA: f64 = 500.0;

/// Share of calories assigned to fat.
pub const FAT_CALORIE_SHARE: f64 = 0.25;

pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Mifflin-St Jeor basal metabolic rate in kcal/day.
pub fn bmr(age: u32, height_cm: f64, weight_kg: f64, gender: Gender) -> f64 {
    let offset = match gender {
        Gender::Male => 5.0,
        Gender::Female | Gender::Other => -161.0,
    };
    10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age) + offset
}

/// TDEE multiplier for an activity level.
pub fn activity_multiplier(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentary => 1.2,
        ActivityLevel::Light => 1.375,
        ActivityLevel::Moderate => 1.55,
        ActivityLevel::Active => 1.725,
        ActivityLevel::VeryActive => 1.9,
    }
}

/// Goal-adjusted daily calories.
pub fn goal_calories(tdee: f64, goal: Goal) -> f64 {
    match goal {
        Goal::Lose => tdee - GOAL_CALORIE_DELTA,
        Goal::Maintain => tdee,
        Goal::Gain => tdee + GOAL_CALORIE_DELTA,
    }
}

/// Protein grams per kilogram of body weight for a goal.
pub fn protein_per_kg(goal: Goal) -> f64 {
    match goal {
        // Extra protein to preserve muscle in a deficit.
        Goal::Lose => 2.2,
        Goal::Maintain => 1.8,
        Goal::Gain => 2.0,
    }
}

/// Compute the full set of targets for a validated profile.
pub fn compute(profile: &Profile) -> MacroResult {
    let bmr = bmr(
        profile.age,
        profile.height_cm,
        profile.weight_kg,
        profile.gender,
    );
    let tdee = bmr * activity_multiplier(profile.activity_level);
    let calories = goal_calories(tdee, profile.goal);

    let protein_g = profile.weight_kg * protein_per_kg(profile.goal);
    let fat_g = (FAT_CALORIE_SHARE * calories) / KCAL_PER_G_FAT;
    let carbs_g =
        (calories - (protein_g * KCAL_PER_G_PROTEIN + fat_g * KCAL_PER_G_FAT)) / KCAL_PER_G_CARBS;

    MacroResult {
        bmr,
        tdee,
        calories,
        protein_g,
        fat_g,
        carbs_g,
    }
}

impl MacroResult {
    /// Copy rounded for display: calories to a whole number, the rest to two
    /// decimals.
    pub fn rounded(&self) -> MacroResult {
        MacroResult {
            bmr: round_to(self.bmr, 2),
            tdee: round_to(self.tdee, 2),
            calories: self.calories.round(),
            protein_g: round_to(self.protein_g, 2),
            fat_g: round_to(self.fat_g, 2),
            carbs_g: round_to(self.carbs_g, 2),
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
