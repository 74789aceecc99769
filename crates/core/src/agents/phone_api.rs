//! Voice provider backed by a telephony HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::VoiceProviderConfig;
use crate::lead::Lead;

use super::{ActionOutcome, ActionResult, VoiceProvider};

/// Places calls through an external telephony HTTP API and waits for the
/// call result.
pub struct PhoneApiVoiceProvider {
    client: Client,
    config: VoiceProviderConfig,
}

#[derive(Debug, Serialize)]
struct CallRequest<'a> {
    lead_id: &'a str,
    phone: &'a str,
    first_name: &'a str,
    last_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct CallResponse {
    status: String,
    #[serde(default)]
    recording_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl PhoneApiVoiceProvider {
    pub fn new(config: VoiceProviderConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn calls_url(&self) -> String {
        format!("{}/calls", self.config.url.trim_end_matches('/'))
    }

    /// Map the API's call status to an outcome.
    fn outcome_from_response(response: CallResponse) -> ActionOutcome {
        let detail = |response: &CallResponse| {
            response
                .message
                .clone()
                .unwrap_or_else(|| format!("call ended with status '{}'", response.status))
        };

        match response.status.as_str() {
            "completed" | "confirmed" => ActionOutcome::Success(ActionResult {
                recording_reference: response.recording_url,
                note: response.message,
            }),
            "declined" | "not_interested" => ActionOutcome::Declined,
            "no_answer" | "busy" | "voicemail" => ActionOutcome::TransientFailure(detail(&response)),
            _ => ActionOutcome::PermanentFailure(detail(&response)),
        }
    }
}

#[async_trait]
impl VoiceProvider for PhoneApiVoiceProvider {
    fn name(&self) -> &str {
        "phone_api"
    }

    async fn place_call(&self, lead: &Lead) -> ActionOutcome {
        let request = CallRequest {
            lead_id: &lead.id,
            phone: &lead.phone,
            first_name: &lead.first_name,
            last_name: &lead.last_name,
        };

        debug!(lead_id = %lead.id, url = %self.calls_url(), "Requesting outreach call");

        let response = match self
            .client
            .post(self.calls_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() || e.is_connect() => {
                return ActionOutcome::TransientFailure(e.to_string());
            }
            Err(e) => return ActionOutcome::PermanentFailure(e.to_string()),
        };

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return ActionOutcome::TransientFailure(format!("telephony API returned {}", status));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return ActionOutcome::PermanentFailure(format!(
                "telephony API returned {}: {}",
                status, body
            ));
        }

        match response.json::<CallResponse>().await {
            Ok(call) => Self::outcome_from_response(call),
            Err(e) => ActionOutcome::PermanentFailure(format!("unreadable call response: {}", e)),
        }
    }
}
