//! HTTP plumbing shared by the submitter and the stream consumer
//!
//! One base service address, two endpoints. Non-success statuses are not
//! turned into errors by the agent; callers receive the status and body so
//! they can surface both.

use mimi_core::{JobId, MimiError};
use serde::Serialize;
use std::io::{BufRead, BufReader};
use std::time::Duration;

use crate::config::MimiConfig;

const SUBMIT_PATH: &str = "/v1/end2end-asset-gen";

/// Client for one service base URL
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    request_timeout: Duration,
    connect_timeout: Duration,
}

/// A completed, fully-read HTTP exchange
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Why an HTTP exchange did not produce a usable response
#[derive(Debug)]
pub enum HttpFailure {
    /// The server answered with a non-success status
    Status { status: u16, body: String },
    /// No response: DNS, connect, TLS, timeout, I/O
    Transport(String),
}

impl HttpFailure {
    fn message(&self) -> String {
        match self {
            HttpFailure::Status { status, .. } => status_line(*status),
            HttpFailure::Transport(msg) => msg.clone(),
        }
    }

    fn parts(self) -> (String, Option<u16>, Option<String>) {
        let message = self.message();
        match self {
            HttpFailure::Status { status, body } => (message, Some(status), Some(body)),
            HttpFailure::Transport(_) => (message, None, None),
        }
    }

    pub fn into_submission_error(self) -> MimiError {
        let (message, status, body) = self.parts();
        MimiError::SubmissionTransport {
            message,
            status,
            body,
        }
    }

    pub fn into_stream_error(self) -> MimiError {
        let (message, status, body) = self.parts();
        MimiError::StreamTransport {
            message,
            status,
            body,
        }
    }
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        let defaults = MimiConfig::default();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: defaults.request_timeout(),
            connect_timeout: defaults.connect_timeout(),
        }
    }

    /// Build from resolved config; `explicit_url` (a CLI flag) wins
    pub fn from_config(config: &MimiConfig, explicit_url: Option<&str>) -> Self {
        Self {
            base_url: config.api_url(explicit_url),
            request_timeout: config.request_timeout(),
            connect_timeout: config.connect_timeout(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn submit_url(&self) -> String {
        format!("{}{}", self.base_url, SUBMIT_PATH)
    }

    /// The job id is percent-encoded as a single path segment
    pub fn stream_url(&self, job_id: &JobId) -> String {
        format!(
            "{}/job/{}/stream",
            self.base_url,
            urlencoding::encode(job_id.as_str())
        )
    }

    /// POST a JSON body with a bearer credential and read the whole reply
    pub fn post_json<T: Serialize>(
        &self,
        url: &str,
        api_key: &str,
        payload: &T,
    ) -> Result<HttpReply, HttpFailure> {
        log::debug!("POST {}", url);
        let agent = self.submit_agent();
        let mut response = agent
            .post(url)
            .header("Authorization", &format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .send_json(payload)
            .map_err(|e| HttpFailure::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| HttpFailure::Transport(format!("failed to read response body: {}", e)))?;
        log::debug!("POST {} -> {}", url, status);

        let reply = HttpReply { status, body };
        if reply.is_success() {
            Ok(reply)
        } else {
            Err(HttpFailure::Status {
                status: reply.status,
                body: reply.body,
            })
        }
    }

    /// GET a long-lived response and hand back its body as a line reader.
    /// Only the connect phase is time-limited.
    pub fn open_stream(&self, url: &str) -> Result<Box<dyn BufRead>, HttpFailure> {
        log::debug!("GET {}", url);
        let agent = self.stream_agent();
        let mut response = agent
            .get(url)
            .call()
            .map_err(|e| HttpFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(HttpFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        log::debug!("GET {} -> {}, streaming", url, status.as_u16());
        Ok(Box::new(BufReader::new(response.into_body().into_reader())))
    }

    fn submit_agent(&self) -> ureq::Agent {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(self.request_timeout))
            .http_status_as_error(false)
            .build();
        config.into()
    }

    fn stream_agent(&self) -> ureq::Agent {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(self.connect_timeout))
            .http_status_as_error(false)
            .build();
        config.into()
    }
}

fn status_line(status: u16) -> String {
    let reason = ureq::http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason());
    match reason {
        Some(reason) => format!("HTTP {} {}", status, reason),
        None => format!("HTTP {}", status),
    }
}
