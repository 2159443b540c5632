//! Account/profile service client.
//!
//! Fetches the child profile attached to the configured parent account and
//! persists finished session results against it. Persistence is
//! best-effort from the session's perspective.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use earlyedge_core::error::ServiceError;
use earlyedge_core::model::ChildProfile;
use earlyedge_core::traits::{ProfileStore, SaveResultRequest};

use crate::common::{build_client, check_status, map_send_error, DEFAULT_TIMEOUT_SECS};

/// Client for the account service's children and save-test-result routes.
pub struct ProfileClient {
    base_url: String,
    parent_id: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

#[derive(Deserialize)]
struct ChildrenResponse {
    #[serde(default)]
    children: Vec<ChildProfile>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveBody<'a> {
    parent_id: &'a str,
    child_name: &'a str,
    test_result: TestResultBody<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TestResultBody<'a> {
    test_name: &'a str,
    result: &'a serde_json::Value,
    date: String,
}

impl ProfileClient {
    pub fn new(base_url: &str, parent_id: &str) -> Self {
        Self::with_timeout(base_url, parent_id, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(base_url: &str, parent_id: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            parent_id: parent_id.to_string(),
            client: build_client(timeout_secs),
            timeout_secs,
        }
    }
}

#[async_trait]
impl ProfileStore for ProfileClient {
    #[instrument(skip(self))]
    async fn fetch_children(&self) -> Result<Vec<ChildProfile>, ServiceError> {
        let response = self
            .client
            .get(format!("{}/children", self.base_url))
            .header("parent-id", &self.parent_id)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let response = check_status(response).await?;
        let body: ChildrenResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;
        Ok(body.children)
    }

    #[instrument(skip(self, request), fields(test = %request.test_name))]
    async fn save_result(&self, request: &SaveResultRequest) -> Result<(), ServiceError> {
        let body = SaveBody {
            parent_id: &self.parent_id,
            child_name: &request.child_name,
            test_result: TestResultBody {
                test_name: &request.test_name,
                result: &request.result,
                date: request.date.to_rfc3339(),
            },
        };

        let response = self
            .client
            .post(format!("{}/save-test-result", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        check_status(response).await?;
        Ok(())
    }
}
