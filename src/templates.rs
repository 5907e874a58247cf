//! Template plans that need no model.
//!
//! [`synthesize`] builds a fixed 7-day meal and workout plan per goal. It is
//! served on its own as a cheap default and is the substitute plan when a
//! caller opts into template fallback on the generative path.
//!
//! [`portion_plan`] is the simpler plan returned by the synchronous calculate
//! endpoint: gram portions scaled to the calorie target.

use crate::model::{ExerciseEntry, Goal, MacroResult, MealDay, MealEntry, TemplatePlan, WorkoutDay};

pub const DEFAULT_DURATION_WEEKS: u32 = 8;
pub const DAYS_PER_WEEK: u8 = 7;

const BASE_MEALS: [&str; 7] = [
    "Oatmeal with berries",
    "Grilled chicken with rice and vegetables",
    "Salmon with quinoa and broccoli",
    "Greek yogurt with honey and almonds",
    "Vegetable omelette with toast",
    "Tuna salad with olive oil",
    "Protein smoothie with banana",
];

/// Build the template plan for a goal.
pub fn synthesize(goal: Goal, weeks: u32) -> TemplatePlan {
    TemplatePlan {
        duration_weeks: weeks,
        meal_plan: meal_plan(goal),
        workout_plan: workout_plan(goal),
    }
}

/// Seven days of meals, cycling through the base pool.
pub fn meal_plan(goal: Goal) -> Vec<MealDay> {
    let meals: Vec<MealEntry> = (0..goal.meals_per_day())
        .map(|i| MealEntry {
            meal_time: format!("Meal {}", i + 1),
            food: BASE_MEALS[i % BASE_MEALS.len()].to_string(),
        })
        .collect();

    (1..=DAYS_PER_WEEK)
        .map(|day| MealDay {
            day,
            meals: meals.clone(),
        })
        .collect()
}

/// Seven days of the same goal-specific exercise block.
pub fn workout_plan(goal: Goal) -> Vec<WorkoutDay> {
    let exercises = exercise_pool(goal);
    (1..=DAYS_PER_WEEK)
        .map(|day| WorkoutDay {
            day,
            exercises: exercises.clone(),
        })
        .collect()
}

fn exercise_pool(goal: Goal) -> Vec<ExerciseEntry> {
    match goal {
        Goal::Gain => vec![
            ExerciseEntry::reps("Squats", 4, "8-12"),
            ExerciseEntry::reps("Deadlifts", 4, "6-10"),
            ExerciseEntry::reps("Bench Press", 4, "8-12"),
            ExerciseEntry::reps("Overhead Press", 3, "10-12"),
            ExerciseEntry::reps("Barbell Row", 4, "8-12"),
        ],
        Goal::Lose => vec![
            ExerciseEntry::timed("Jump Rope", 4, "2 min"),
            ExerciseEntry::reps("Burpees", 3, "20"),
            ExerciseEntry::reps("Mountain Climbers", 3, "30"),
            ExerciseEntry::reps("Bodyweight Squats", 4, "20"),
            ExerciseEntry::reps("Push-ups", 4, "15"),
        ],
        Goal::Maintain => vec![
            ExerciseEntry::reps("Lunges", 3, "12-15"),
            ExerciseEntry::reps("Incline Push-ups", 3, "15"),
            ExerciseEntry::reps("Lat Pulldown", 3, "10-12"),
            ExerciseEntry::timed("Plank", 3, "1 min"),
            ExerciseEntry::reps("Dumbbell Curls", 3, "12"),
        ],
    }
}

/// Simple plan with portions sized to the calorie target.
#[derive(Debug, Clone, PartialEq)]
pub struct PortionPlan {
    pub meal_plan: Vec<String>,
    pub workout_plan: Vec<String>,
}

/// Calorie split across breakfast, lunch, dinner and snack.
const MEAL_SPLIT: [f64; 4] = [0.25, 0.35, 0.30, 0.10];

/// A food making up `share` of a meal, at `kcal_per_g`.
struct Portion {
    food: &'static str,
    share: f64,
    kcal_per_g: f64,
}

const fn portion(food: &'static str, share: f64, kcal_per_g: f64) -> Portion {
    Portion {
        food,
        share,
        kcal_per_g,
    }
}

const MEAL_PORTIONS: [(&str, &[Portion]); 4] = [
    (
        "Breakfast",
        &[
            portion("oats", 0.4, 3.8),
            portion("eggs", 0.3, 1.55),
            portion("fruits", 0.3, 0.52),
        ],
    ),
    (
        "Lunch",
        &[
            portion("grilled chicken", 0.5, 1.65),
            portion("brown rice", 0.35, 3.6),
            portion("veggies", 0.15, 0.5),
        ],
    ),
    (
        "Dinner",
        &[
            portion("baked fish", 0.5, 2.0),
            portion("whole grain pasta", 0.35, 3.5),
            portion("salad", 0.15, 0.4),
        ],
    ),
    (
        "Snack",
        &[portion("mixed nuts", 0.6, 6.0), portion("fruit", 0.4, 0.52)],
    ),
];

/// Split the calorie target into four meals of gram portions, plus a short
/// goal-keyed workout outline.
pub fn portion_plan(macros: &MacroResult, goal: Goal) -> PortionPlan {
    let meal_plan = MEAL_PORTIONS
        .iter()
        .zip(MEAL_SPLIT)
        .map(|((label, portions), split)| {
            let meal_kcal = macros.calories * split;
            let items: Vec<String> = portions
                .iter()
                .map(|p| format!("{}g {}", grams(meal_kcal, p), p.food))
                .collect();
            format!("{label}: {}", items.join(" + "))
        })
        .collect();

    let workout_plan = match goal {
        Goal::Lose => [
            "40 mins cardio + 15 mins HIIT",
            "Full-body resistance training (3x sets)",
            "Mobility + core strengthening",
        ],
        Goal::Gain => [
            "Heavy push day (Bench, OHP, Dips)",
            "Leg hypertrophy (Squats, Deadlifts)",
            "Pull workout (Rows, Pullups, Curls)",
        ],
        Goal::Maintain => [
            "Full-body strength (3x per week)",
            "Cardio 30 mins",
            "Core + stretching",
        ],
    }
    .iter()
    .map(|s| s.to_string())
    .collect();

    PortionPlan {
        meal_plan,
        workout_plan,
    }
}

fn grams(meal_kcal: f64, portion: &Portion) -> i64 {
    ((meal_kcal * portion.share) / portion.kcal_per_g).round() as i64
}
