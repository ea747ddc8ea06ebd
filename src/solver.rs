//! Client for a FlareSolverr instance.
//!
//! FlareSolverr drives a real browser, so a `request.get` command returns the
//! page the browser ended up rendering once any anti-bot challenge cleared.

use crate::config::{SolverConfig, SolverContext};
use crate::error::BypassError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// A cookie in the shape FlareSolverr accepts and returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverCookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolverCommand<'a> {
    cmd: &'static str,
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cookies: Option<&'a [SolverCookie]>,
    max_timeout: u64,
}

#[derive(Debug, Deserialize)]
struct SolverEnvelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    solution: Option<Solution>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub cookies: Vec<SolverCookie>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

pub struct SolverClient {
    endpoint: String,
    context: SolverContext,
    max_timeout_ms: u64,
    client: reqwest::Client,
}

impl SolverClient {
    pub fn new(config: &SolverConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("sotwe-feed/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: format!("{}/v1", config.url.trim_end_matches('/')),
            context: config.context.clone(),
            max_timeout_ms: config.max_timeout_ms,
            client,
        }
    }

    /// Ask the solver to load `url` in its browser and return the solution.
    ///
    /// The envelope must report `status: "ok"` and carry a response body;
    /// anything else is returned as [`BypassError::Rejected`] with the raw
    /// envelope attached.
    pub async fn get(&self, url: &str) -> Result<Solution, BypassError> {
        let (session, cookies) = match &self.context {
            SolverContext::Session { session } => (Some(session.as_str()), None),
            SolverContext::Cookies { cookies } => (None, Some(cookies.as_slice())),
        };

        debug!(
            target_url = url,
            solver = %self.endpoint,
            session = session.unwrap_or("-"),
            "requesting via FlareSolverr"
        );

        let command = SolverCommand {
            cmd: "request.get",
            url,
            session,
            cookies,
            max_timeout: self.max_timeout_ms,
        };

        // FlareSolverr reports failures as JSON with a 500 status, so the
        // body is read regardless of the HTTP status.
        let body = self
            .client
            .post(&self.endpoint)
            .json(&command)
            .send()
            .await?
            .text()
            .await?;

        let raw: serde_json::Value =
            serde_json::from_str(&body).map_err(|_| BypassError::InvalidEnvelope { body })?;

        validate_envelope(raw)
    }
}

fn validate_envelope(raw: serde_json::Value) -> Result<Solution, BypassError> {
    let envelope: SolverEnvelope = match serde_json::from_value(raw.clone()) {
        Ok(envelope) => envelope,
        Err(_) => return Err(BypassError::Rejected { envelope: raw }),
    };

    match envelope.solution {
        Some(solution)
            if envelope.status == "ok"
                && solution.response.as_deref().is_some_and(|r| !r.is_empty()) =>
        {
            Ok(solution)
        }
        _ => Err(BypassError::Rejected { envelope: raw }),
    }
}
