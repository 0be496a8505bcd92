use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use thiserror::Error;

use super::wire::ExecuteRequest;
use crate::config::SandboxConfig;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("no API key is configured for the execution service")]
    MissingCredential,
    #[error("request to the execution service failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("execution service answered {status}")]
    Status { status: u16 },
    #[error("execution service returned an unreadable body: {0}")]
    Body(String),
}

/// HTTP client for the remote execution service.
///
/// One request per call, no retries; a user re-run is the retry.
pub struct SandboxClient {
    http: reqwest::Client,
    execute_url: String,
    api_key: Option<String>,
    require_api_key: bool,
}

impl SandboxClient {
    pub fn new(config: &SandboxConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        if config.require_api_key && config.api_key.is_none() {
            log::warn!("Execution service requires an API key but none is configured");
        }

        Ok(Self {
            http,
            execute_url: format!("{}/execute", config.url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            require_api_key: config.require_api_key,
        })
    }

    /// Sends `request` and returns the decoded JSON body.
    ///
    /// Non-2xx responses that still carry a JSON object are returned as `Ok`
    /// so the interpreter can read whatever detail they hold.
    pub async fn execute(&self, request: &ExecuteRequest) -> Result<Value, SandboxError> {
        if self.require_api_key && self.api_key.is_none() {
            return Err(SandboxError::MissingCredential);
        }

        let mut builder = self.http.post(&self.execute_url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header(AUTHORIZATION, key);
        }

        log::debug!(
            "Sending {} {} program to {}",
            request.language,
            request.version,
            self.execute_url
        );
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        let parsed = serde_json::from_str::<Value>(&body);

        if status.is_success() {
            return parsed.map_err(|e| SandboxError::Body(e.to_string()));
        }

        match parsed {
            Ok(value) if value.is_object() => {
                log::warn!("Execution service answered {status} with a structured body");
                Ok(value)
            }
            _ => {
                log::error!("Execution service answered {status}");
                Err(SandboxError::Status {
                    status: status.as_u16(),
                })
            }
        }
    }
}
