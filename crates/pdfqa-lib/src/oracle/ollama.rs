use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::AnswerOracle;
use crate::config::OracleConfig;
use crate::error::OracleError;

/// Blocking client for Ollama's `/api/generate` endpoint.
pub struct OllamaClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    config: OracleConfig,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_ctx: u32,
    num_batch: u32,
    num_thread: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(config: OracleConfig) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let endpoint = format!("{}/api/generate", config.base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
                num_ctx: self.config.num_ctx,
                num_batch: self.config.num_batch,
                num_thread: self.config.num_thread,
            },
        }
    }
}

impl AnswerOracle for OllamaClient {
    fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        debug!(
            model = %self.config.model,
            endpoint = %self.endpoint,
            prompt_len = prompt.len(),
            "Requesting completion"
        );
        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.request_body(prompt))
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout {
                        secs: self.config.timeout_secs,
                    }
                } else {
                    OracleError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(status = %status, body = %body, "Oracle returned an error status");
            return Err(OracleError::Status {
                status: status.as_u16(),
            });
        }

        let parsed: GenerateResponse = response.json().map_err(|e| {
            if e.is_timeout() {
                OracleError::Timeout {
                    secs: self.config.timeout_secs,
                }
            } else {
                OracleError::MalformedResponse(e.to_string())
            }
        })?;
        let answer = parsed.response.trim().to_string();
        if answer.is_empty() {
            return Err(OracleError::MalformedResponse(
                "empty completion".to_string(),
            ));
        }
        debug!(answer_len = answer.len(), "Received completion");
        Ok(answer)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}
