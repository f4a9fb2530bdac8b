//! Job lifecycle
//!
//! `NotStarted -> Submitted -> Streaming -> Terminal`. Attaching to an
//! existing job id skips `Submitted`, and with it any need for a credential.

use mimi_core::{JobId, Result};

use crate::client::ApiClient;
use crate::job::{JobHandle, JobRecord, JobStore};
use crate::report::Reporter;
use crate::request::JobRequest;
use crate::stream::{ErrorPolicy, StreamConsumer, StreamOutcome};
use crate::submit::JobSubmitter;

/// How a run begins
#[derive(Debug, Clone)]
pub enum JobStart {
    /// Create a new job, then follow it
    Submit { api_key: String, request: JobRequest },
    /// Follow a job that is already running
    Attach(JobId),
}

/// Where a session is in the job lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    NotStarted,
    Submitted(JobHandle),
    Streaming(JobId),
    Terminal(StreamOutcome),
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::NotStarted => "not-started",
            Phase::Submitted(_) => "submitted",
            Phase::Streaming(_) => "streaming",
            Phase::Terminal(_) => "terminal",
        }
    }
}

/// Drives one job from start (or attach) to the end of its stream
pub struct Session<'a> {
    client: &'a ApiClient,
    policy: ErrorPolicy,
    store: Option<JobStore>,
    phase: Phase,
}

impl<'a> Session<'a> {
    pub fn new(client: &'a ApiClient, policy: ErrorPolicy) -> Self {
        Self {
            client,
            policy,
            store: None,
            phase: Phase::NotStarted,
        }
    }

    /// Remember submitted jobs in `store`
    pub fn with_store(mut self, store: JobStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    fn advance(&mut self, next: Phase) {
        log::debug!("session {} -> {}", self.phase.name(), next.name());
        self.phase = next;
    }

    pub fn run(&mut self, start: JobStart, reporter: &mut dyn Reporter) -> Result<StreamOutcome> {
        let job_id = match start {
            JobStart::Submit { api_key, request } => {
                let handle = JobSubmitter::new(self.client).submit(&api_key, &request, reporter)?;
                self.remember(&handle, &request);
                let job_id = handle.job_id.clone();
                self.advance(Phase::Submitted(handle));
                job_id
            }
            JobStart::Attach(job_id) => {
                reporter.reconnecting(&job_id)?;
                job_id
            }
        };

        self.advance(Phase::Streaming(job_id.clone()));
        let outcome = StreamConsumer::new(self.client, self.policy).follow(&job_id, reporter)?;
        self.advance(Phase::Terminal(outcome.clone()));
        Ok(outcome)
    }

    fn remember(&self, handle: &JobHandle, request: &JobRequest) {
        let Some(store) = &self.store else {
            return;
        };
        let record = JobRecord::new(handle, request, self.client.base_url());
        match store.save(&record) {
            Ok(path) => log::debug!("recorded job {} at {}", handle.job_id, path.display()),
            Err(e) => log::warn!("could not record job {}: {}", handle.job_id, e),
        }
    }
}
