//! Best-effort audit log of generation requests.
//!
//! Logging runs after the plan is built, on its own task, and owns its own
//! failure domain: a serialization error or an unreachable store is reported
//! through `tracing` and dropped, never returned to the caller. A slow or
//! locked store never holds up a response.

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::model::{GeneratedPlan, Profile};
use crate::storage::Storage;

/// Writes one `model_requests` row per generation.
#[derive(Clone)]
pub struct RequestLogger {
    storage: Storage,
}

impl RequestLogger {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Record a request on a background task.
    ///
    /// The handle is only for callers that need to wait for the write; the
    /// request path drops it.
    pub fn spawn(
        &self,
        profile: Profile,
        result: GeneratedPlan,
        model_name: String,
        user_ref: Option<i64>,
    ) -> JoinHandle<()> {
        let logger = self.clone();
        tokio::spawn(async move {
            logger.log(&profile, &result, &model_name, user_ref).await;
        })
    }

    /// Record a request and its result. Never fails.
    pub async fn log(
        &self,
        profile: &Profile,
        result: &GeneratedPlan,
        model_name: &str,
        user_ref: Option<i64>,
    ) {
        match self.try_log(profile, result, model_name, user_ref).await {
            Ok(id) => debug!(record_id = id, user_id = ?user_ref, "Model request logged"),
            Err(e) => warn!(
                user_id = ?user_ref,
                error = %e,
                "Failed to log model request"
            ),
        }
    }

    async fn try_log(
        &self,
        profile: &Profile,
        result: &GeneratedPlan,
        model_name: &str,
        user_ref: Option<i64>,
    ) -> anyhow::Result<i64> {
        let request_json = serde_json::to_string(profile)?;
        let response_json = serde_json::to_string(result)?;

        self.storage
            .insert_model_request(user_ref, &request_json, &response_json, model_name)
            .await
    }
}
