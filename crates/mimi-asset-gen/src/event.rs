//! Progress stream records
//!
//! Every line of the job stream is an independent JSON object tagged by a
//! `status` field. Decoding happens once, here; everything downstream works
//! with the closed [`StreamEvent`] enum.

use mimi_core::{MimiError, Result};
use serde::Deserialize;
use serde_json::Value;

/// Payload of a successful job
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobResult {
    pub message: Option<String>,
    pub download_links: Vec<String>,
}

impl JobResult {
    /// Read what can be read from a `result` value; anything of the wrong
    /// shape counts as absent.
    fn from_value(value: &Value) -> Self {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        let download_links = value
            .get("download_links")
            .and_then(Value::as_array)
            .map(|links| {
                links
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            message: present(message),
            download_links,
        }
    }
}

/// One decoded stream record
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Progress {
        message: Option<String>,
        client_status: Option<String>,
    },
    Success {
        total_duration: Option<f64>,
        result: JobResult,
    },
    Error {
        message: Option<String>,
    },
    /// Unknown status, or a line that is not a well-formed record
    Unrecognized { raw: String },
}

impl StreamEvent {
    /// Decode one line. Never fails: anything unparseable becomes
    /// [`StreamEvent::Unrecognized`] carrying the original text.
    pub fn decode(line: &str) -> Self {
        match Self::try_decode(line) {
            Ok(event) => event,
            Err(e) => {
                log::debug!("{}", e);
                StreamEvent::Unrecognized {
                    raw: line.to_string(),
                }
            }
        }
    }

    /// Strict decode, reporting why a line was rejected
    pub fn try_decode(line: &str) -> Result<Self> {
        let wire: WireEvent =
            serde_json::from_str(line).map_err(|e| MimiError::RecordDecode {
                line: line.to_string(),
                reason: e.to_string(),
            })?;
        Ok(wire.into())
    }

    /// Success is the only event that ends a session by itself
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Success { .. })
    }
}

#[derive(Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum WireEvent {
    Progress {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        client_status: Option<String>,
    },
    // Success must end the session whatever shape its payload has
    Success {
        #[serde(default)]
        total_duration: Value,
        #[serde(default)]
        result: Value,
    },
    Error {
        #[serde(default)]
        message: Option<String>,
    },
}

impl From<WireEvent> for StreamEvent {
    fn from(wire: WireEvent) -> Self {
        match wire {
            WireEvent::Progress {
                message,
                client_status,
            } => StreamEvent::Progress {
                message: present(message),
                client_status: present(client_status),
            },
            WireEvent::Success {
                total_duration,
                result,
            } => StreamEvent::Success {
                total_duration: total_duration.as_f64(),
                result: JobResult::from_value(&result),
            },
            WireEvent::Error { message } => StreamEvent::Error {
                message: present(message),
            },
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
