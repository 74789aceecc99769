//! Entry provider backed by the enrollment portal's submission endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::EntryProviderConfig;
use crate::lead::Lead;

use super::{ActionOutcome, ActionResult, EntryProvider};

/// Submits leads to the enrollment portal over HTTP.
pub struct PortalEntryProvider {
    client: Client,
    config: EntryProviderConfig,
}

#[derive(Debug, Serialize)]
struct SubmissionForm<'a> {
    first_name: &'a str,
    last_name: &'a str,
    phone: &'a str,
    email: &'a str,
    address: Option<&'a str>,
    city: Option<&'a str>,
    state: Option<&'a str>,
    zip_code: Option<&'a str>,
}

impl PortalEntryProvider {
    pub fn new(config: EntryProviderConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn form_for<'a>(lead: &'a Lead) -> SubmissionForm<'a> {
        SubmissionForm {
            first_name: &lead.first_name,
            last_name: &lead.last_name,
            phone: &lead.phone,
            email: &lead.email,
            address: lead.address.as_deref(),
            city: lead.city.as_deref(),
            state: lead.state.as_deref(),
            zip_code: lead.zip_code.as_deref(),
        }
    }
}

#[async_trait]
impl EntryProvider for PortalEntryProvider {
    fn name(&self) -> &str {
        "portal"
    }

    async fn submit(&self, lead: &Lead) -> ActionOutcome {
        debug!(lead_id = %lead.id, url = %self.config.url, "Submitting lead to portal");

        let response = match self
            .client
            .post(&self.config.url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .json(&Self::form_for(lead))
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
        if status.is_success() {
            return ActionOutcome::Success(ActionResult {
                recording_reference: None,
                note: Some("portal accepted submission".to_string()),
            });
        }
        if status.is_server_error() || status.as_u16() == 429 {
            return ActionOutcome::TransientFailure(format!("portal returned {}", status));
        }

        let body = response.text().await.unwrap_or_default();
        ActionOutcome::PermanentFailure(format!("portal returned {}: {}", status, body))
    }
}
