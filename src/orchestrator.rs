//! Generative plan orchestration.
//!
//! # Flow
//!
//! 1. Compute macros for the profile.
//! 2. Prompt the model for a 7-day meal and workout plan wrapped in
//!    `BEGIN_JSON` / `END_JSON`.
//! 3. Extract and parse the block (see [`crate::extraction`]).
//! 4. On any failure, prompt exactly once more with a strict-JSON reminder.
//! 5. If that fails too, return empty plans with `error` set, or the template
//!    plan when the caller asked for [`FallbackPolicy::Template`].
//! 6. Hand the finished plan to the request logger on a background task.
//!
//! The model is never called more than twice per request. Without a
//! configured generator the model is not called at all and step 5 applies
//! directly.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::extraction::{ExtractionError, extract_plan};
use crate::generator::{GenerationError, SamplingParams, TextGenerator};
use crate::model::{GeneratedPlan, Goal, PlanIdeas, Profile};
use crate::nutrition;
use crate::request_log::RequestLogger;
use crate::templates::{self, DEFAULT_DURATION_WEEKS};

/// Appended to the prompt for the single retry.
pub const STRICT_SUFFIX: &str = "\nSTRICT: Output must be valid JSON only.";

/// `error` value when empty plans are returned.
pub const FALLBACK_ERROR: &str = "Model output invalid - fallback used.";

/// `error` value when the template plan is substituted.
pub const TEMPLATE_FALLBACK_ERROR: &str = "Model output invalid - template plan used.";

/// Model identifier logged when no generator is configured.
pub const NO_MODEL: &str = "none";

/// What to return once the model has failed twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Empty meal and workout plans with `error` set.
    #[default]
    ErrorFlag,
    /// The goal's template plan, with `error` set.
    Template,
}

impl FallbackPolicy {
    /// Parse the `fallback` query value.
    pub fn from_param(value: Option<&str>) -> Option<Self> {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("none") | Some("error") => Some(FallbackPolicy::ErrorFlag),
            Some("template") => Some(FallbackPolicy::Template),
            Some(_) => None,
        }
    }
}

/// States of one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanState {
    Prompted,
    RetryPrompted,
    Parsed,
    Failed,
}

/// Why a single model attempt produced no plan.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Result of running the prompt/retry state machine.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Parsed plan content, if any attempt succeeded.
    pub ideas: Option<PlanIdeas>,
    /// States visited, in order.
    pub states: Vec<PlanState>,
}

/// Builds generated plans for validated profiles.
#[derive(Clone)]
pub struct PlanOrchestrator {
    generator: Option<Arc<dyn TextGenerator>>,
    logger: Option<RequestLogger>,
    params: SamplingParams,
}

impl PlanOrchestrator {
    /// `None` runs without a model: every request takes the fallback path.
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            generator,
            logger: None,
            params: SamplingParams::default(),
        }
    }

    pub fn with_logger(mut self, logger: RequestLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_sampling(mut self, params: SamplingParams) -> Self {
        self.params = params;
        self
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    pub fn model_name(&self) -> &str {
        self.generator
            .as_deref()
            .map(|g| g.model_name())
            .unwrap_or(NO_MODEL)
    }

    /// Generate a plan, returning empty plans with `error` set on failure.
    pub async fn orchestrate(&self, profile: &Profile, user_ref: Option<i64>) -> GeneratedPlan {
        self.orchestrate_with(profile, user_ref, FallbackPolicy::ErrorFlag)
            .await
    }

    /// Generate a plan with an explicit fallback policy.
    #[instrument(skip(self, profile), fields(goal = %profile.goal))]
    pub async fn orchestrate_with(
        &self,
        profile: &Profile,
        user_ref: Option<i64>,
        fallback: FallbackPolicy,
    ) -> GeneratedPlan {
        let macros = nutrition::compute(profile);
        let prompt = build_prompt(profile);
        let outcome = self.generate_ideas(&prompt).await;

        let (ideas, error) = match outcome.ideas {
            Some(ideas) => (ideas, None),
            None => fallback_ideas(profile.goal, fallback),
        };

        let plan = GeneratedPlan {
            macros: macros.rounded(),
            meal_plan: ideas.meal_plan,
            workout_plan: ideas.workout_plan,
            duration_weeks: DEFAULT_DURATION_WEEKS,
            error,
        };

        info!(
            states = ?outcome.states,
            meal_days = plan.meal_plan.len(),
            workout_days = plan.workout_plan.len(),
            fallback = plan.error.is_some(),
            "Plan generated"
        );

        if let Some(logger) = &self.logger {
            logger.spawn(
                *profile,
                plan.clone(),
                self.model_name().to_string(),
                user_ref,
            );
        }

        plan
    }

    /// Run the prompt, retry once with [`STRICT_SUFFIX`], then give up.
    pub async fn generate_ideas(&self, prompt: &str) -> GenerationOutcome {
        let Some(generator) = self.generator.as_deref() else {
            debug!("No generator configured");
            return GenerationOutcome {
                ideas: None,
                states: vec![PlanState::Failed],
            };
        };

        let mut states = vec![PlanState::Prompted];
        match self.attempt(generator, prompt).await {
            Ok(ideas) => {
                states.push(PlanState::Parsed);
                return GenerationOutcome {
                    ideas: Some(ideas),
                    states,
                };
            }
            Err(e) => warn!(error = %e, "Model output unusable, retrying with strict prompt"),
        }

        states.push(PlanState::RetryPrompted);
        let retry_prompt = format!("{prompt}{STRICT_SUFFIX}");
        match self.attempt(generator, &retry_prompt).await {
            Ok(ideas) => {
                states.push(PlanState::Parsed);
                GenerationOutcome {
                    ideas: Some(ideas),
                    states,
                }
            }
            Err(e) => {
                warn!(error = %e, "Model output unusable after retry");
                states.push(PlanState::Failed);
                GenerationOutcome { ideas: None, states }
            }
        }
    }

    async fn attempt(
        &self,
        generator: &dyn TextGenerator,
        prompt: &str,
    ) -> Result<PlanIdeas, AttemptError> {
        let raw = generator.generate(prompt, &self.params).await?;
        debug!(raw_output = %raw, "Raw model output");
        Ok(extract_plan(&raw)?)
    }
}

fn fallback_ideas(goal: Goal, fallback: FallbackPolicy) -> (PlanIdeas, Option<String>) {
    match fallback {
        FallbackPolicy::ErrorFlag => (PlanIdeas::default(), Some(FALLBACK_ERROR.to_string())),
        FallbackPolicy::Template => (
            templates::synthesize(goal, DEFAULT_DURATION_WEEKS).into(),
            Some(TEMPLATE_FALLBACK_ERROR.to_string()),
        ),
    }
}

fn goal_focus(goal: Goal) -> &'static str {
    match goal {
        Goal::Lose => "fat loss",
        Goal::Maintain => "balance",
        Goal::Gain => "hypertrophy",
    }
}

/// Instruction sent to the model for a profile.
pub fn build_prompt(profile: &Profile) -> String {
    format!(
        r#"
You are a professional AI fitness assistant.

USER PROFILE:
- Age: {age}
- Gender: {gender}
- Height: {height} cm
- Weight: {weight} kg
- Activity: {activity}
- Goal: {goal}

TASK:
Generate a 7-day meal plan and a 7-day workout plan tailored to the user's goal.

Rules:
- Exactly 7 days, and each day must be different.
- Meals: {meals} per day (3/day if lose or maintain, 4/day if gain).
- Workouts: 3-5 exercises per day.
- Focus on the goal ({focus}).

Respond ONLY with valid JSON between BEGIN_JSON and END_JSON.
Do not include explanations or comments.

FORMAT:
BEGIN_JSON
{{
  "meal_plan": [
    {{
      "day": 1,
      "meals": [
        {{"meal_time": "breakfast", "food": "Oats with berries"}}
      ]
    }}
  ],
  "workout_plan": [
    {{
      "day": 1,
      "exercises": [
        {{"name": "Squats", "sets": 3, "reps": "8-12"}}
      ]
    }}
  ]
}}
END_JSON
"#,
        age = profile.age,
        gender = profile.gender.as_str(),
        height = profile.height_cm,
        weight = profile.weight_kg,
        activity = profile.activity_level.as_str(),
        goal = profile.goal.as_str(),
        meals = profile.goal.meals_per_day(),
        focus = goal_focus(profile.goal),
    )
}
