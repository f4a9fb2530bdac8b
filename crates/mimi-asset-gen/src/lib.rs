//! Mimi Asset Gen - client for the Mimi end-to-end asset generation service
//!
//! Submits generation jobs, then attaches to the job's newline-delimited
//! progress stream and classifies each record into a small state machine
//! (progress, success, error, unrecognised). A job id supplied up front
//! skips submission entirely, which is how clients reconnect to running jobs.

pub mod client;
pub mod config;
pub mod event;
pub mod job;
pub mod report;
pub mod request;
pub mod session;
pub mod stream;
pub mod submit;

#[cfg(test)]
mod testing;

pub use client::ApiClient;
pub use config::MimiConfig;
pub use event::StreamEvent;
pub use job::{JobHandle, JobRecord, JobStore};
pub use report::{Notice, Reporter, TerminalReporter};
pub use request::{ImageInput, JobRequest, SubmitPayload};
pub use session::{JobStart, Phase, Session};
pub use stream::{ErrorPolicy, SeenStages, StreamConsumer, StreamOutcome};
pub use submit::JobSubmitter;
