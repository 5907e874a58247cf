//! Pull a JSON plan out of free-form model output.
//!
//! The model is asked to wrap its answer in `BEGIN_JSON` / `END_JSON`. Small
//! local models rarely follow that perfectly, so extraction tolerates prose
//! around the markers and makes a single cleanup pass (code fences, newlines,
//! a trailing comma) before giving up.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::model::PlanIdeas;

pub const BEGIN_MARKER: &str = "BEGIN_JSON";
pub const END_MARKER: &str = "END_JSON";

static SENTINEL_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)BEGIN_JSON(.*?)END_JSON").expect("sentinel pattern is valid")
});

/// Why a model response could not be turned into a plan.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no BEGIN_JSON/END_JSON block in model output")]
    MissingMarkers,

    #[error("malformed plan JSON after cleanup: {0}")]
    MalformedJson(#[source] serde_json::Error),
}

/// Return the trimmed text between the first pair of sentinel markers.
pub fn sentinel_block(raw: &str) -> Result<&str, ExtractionError> {
    SENTINEL_BLOCK
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .ok_or(ExtractionError::MissingMarkers)
}

/// Extract and parse the plan payload from raw model output.
pub fn extract_plan(raw: &str) -> Result<PlanIdeas, ExtractionError> {
    let candidate = sentinel_block(raw)?;

    match serde_json::from_str::<PlanIdeas>(candidate) {
        Ok(ideas) => Ok(ideas),
        Err(_) => {
            let cleaned = clean_candidate(candidate);
            serde_json::from_str(&cleaned).map_err(ExtractionError::MalformedJson)
        }
    }
}

/// Strip code fences and newlines, then a trailing comma.
fn clean_candidate(candidate: &str) -> String {
    candidate
        .replace("```json", "")
        .replace("```", "")
        .replace(['\r', '\n'], "")
        .trim()
        .trim_end_matches(',')
        .to_string()
}
