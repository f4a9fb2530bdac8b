//! Progress stream consumption
//!
//! A session reads newline-framed records until the server closes the
//! connection or a success record arrives. Each record is decoded once into
//! a [`StreamEvent`], classified into a [`Notice`], and handed to the
//! reporter. Malformed lines never end a session.

use mimi_core::{JobId, MimiError, Result};
use std::collections::HashSet;
use std::io::BufRead;

use crate::client::ApiClient;
use crate::event::StreamEvent;
use crate::report::{Notice, Reporter, STAGE_COMPLETE_MARKER};

/// What to do when the server emits an `error` record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Show it and keep reading; a later record may still report success
    #[default]
    Continue,
    /// Show it and end the session with [`MimiError::ServerReported`]
    Stop,
}

/// How a session ended, when it did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    Completed {
        total_duration: Option<f64>,
        download_links: Vec<String>,
    },
    /// End of stream without a success record
    Closed { server_errors: usize },
}

/// Stages already announced in one session
#[derive(Debug, Default)]
pub struct SeenStages {
    stages: HashSet<String>,
}

impl SeenStages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `stage`; true only the first time it is seen
    pub fn first_sighting(&mut self, stage: &str) -> bool {
        if self.stages.contains(stage) {
            return false;
        }
        self.stages.insert(stage.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Map one event to what the user should see.
///
/// Progress precedence is fixed: completion marker, then a new stage, then
/// the plain message. Only one branch applies per event.
pub fn classify(event: &StreamEvent, seen: &mut SeenStages) -> Notice {
    match event {
        StreamEvent::Progress {
            message,
            client_status,
        } => {
            if let Some(done) = message.as_deref().and_then(strip_stage_marker) {
                return Notice::StageCompleted(done.to_string());
            }
            if let Some(stage) = client_status.as_deref() {
                if seen.first_sighting(stage) {
                    return Notice::StageStarted(stage.to_string());
                }
            }
            match message {
                Some(text) => Notice::Log(text.clone()),
                None => Notice::Quiet,
            }
        }
        StreamEvent::Success {
            total_duration,
            result,
        } => Notice::Completed {
            total_duration: *total_duration,
            message: result
                .message
                .clone()
                .unwrap_or_else(|| "Success".to_string()),
            download_links: result.download_links.clone(),
        },
        StreamEvent::Error { message } => Notice::ServerError(
            message
                .clone()
                .unwrap_or_else(|| "unknown error".to_string()),
        ),
        StreamEvent::Unrecognized { raw } => Notice::Raw(raw.clone()),
    }
}

fn strip_stage_marker(message: &str) -> Option<&str> {
    message
        .strip_prefix(STAGE_COMPLETE_MARKER)
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
}

/// Reads one job's event stream
pub struct StreamConsumer<'a> {
    client: &'a ApiClient,
    policy: ErrorPolicy,
}

impl<'a> StreamConsumer<'a> {
    pub fn new(client: &'a ApiClient, policy: ErrorPolicy) -> Self {
        Self { client, policy }
    }

    /// Connect to the job's stream and consume it to the end
    pub fn follow(&self, job_id: &JobId, reporter: &mut dyn Reporter) -> Result<StreamOutcome> {
        let url = self.client.stream_url(job_id);
        let reader = self
            .client
            .open_stream(&url)
            .map_err(|e| e.into_stream_error())?;
        reporter.stream_opened(&url)?;

        let outcome = consume(reader, self.policy, reporter)?;
        if let StreamOutcome::Closed { .. } = outcome {
            reporter.stream_closed(job_id)?;
        }
        Ok(outcome)
    }
}

/// Consume newline-framed records from `reader`.
///
/// The set of seen stages is created here and dropped on return, so every
/// session (including a reconnect) announces stages afresh.
pub fn consume<R: BufRead>(
    mut reader: R,
    policy: ErrorPolicy,
    reporter: &mut dyn Reporter,
) -> Result<StreamOutcome> {
    let mut seen = SeenStages::new();
    let mut server_errors = 0usize;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| MimiError::StreamTransport {
                message: format!("stream interrupted: {}", e),
                status: None,
                body: None,
            })?;
        if read == 0 {
            log::debug!("stream closed by server");
            return Ok(StreamOutcome::Closed { server_errors });
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }

        let event = StreamEvent::decode(line);
        reporter.notice(&classify(&event, &mut seen))?;

        if event.is_terminal() {
            log::debug!("job finished after {} announced stage(s)", seen.len());
        }
        match event {
            StreamEvent::Success {
                total_duration,
                result,
            } => {
                return Ok(StreamOutcome::Completed {
                    total_duration,
                    download_links: result.download_links,
                });
            }
            StreamEvent::Error { message } => {
                server_errors += 1;
                if policy == ErrorPolicy::Stop {
                    return Err(MimiError::ServerReported(
                        message.unwrap_or_else(|| "unknown error".to_string()),
                    ));
                }
            }
            _ => {}
        }
    }
}
