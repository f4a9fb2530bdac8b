//! Job handles and local job history
//!
//! A [`JobHandle`] lives only for one run. Submitted jobs are also recorded
//! as `.job.toml` files in `.mimi/jobs/` so they can be found and reattached
//! after the process exits.

use chrono::{SecondsFormat, Utc};
use mimi_core::{JobId, MimiError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::request::JobRequest;

/// The link between a submission and the stream it is followed by
#[derive(Debug, Clone, PartialEq)]
pub struct JobHandle {
    pub job_id: JobId,
    /// Whatever the server reported, rendered as text; `None` when unknown
    pub credits_remaining: Option<String>,
    pub batch_size: u32,
}

impl JobHandle {
    /// Shell command that reattaches to this job
    pub fn reconnect_command(&self, program: &str) -> String {
        Self::reconnect_command_for(program, &self.job_id)
    }

    pub fn reconnect_command_for(program: &str, job_id: &JobId) -> String {
        format!("{} generate --job-id {}", program, job_id)
    }
}

/// A submitted job as remembered on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub target: String,
    pub prompt: String,
    pub batch_size: u32,
    /// Credits reported when the job was accepted
    #[serde(default)]
    pub credits_remaining: Option<String>,
    /// Service the job was submitted to
    pub api_url: String,
    /// `sha256:` digest of the embedded reference image, if any
    #[serde(default)]
    pub image_digest: Option<String>,
    /// RFC 3339 UTC timestamp
    pub submitted_at: String,
}

impl JobRecord {
    pub fn new(handle: &JobHandle, request: &JobRequest, api_url: &str) -> Self {
        Self {
            job_id: handle.job_id.clone(),
            target: request.target().to_string(),
            prompt: request.prompt().to_string(),
            batch_size: handle.batch_size,
            credits_remaining: handle.credits_remaining.clone(),
            api_url: api_url.to_string(),
            image_digest: request.image().digest().map(|d| d.to_prefixed_hex()),
            submitted_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// File-based job history in `.mimi/jobs/`
pub struct JobStore {
    root: PathBuf,
}

impl JobStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Default history location, relative to the working directory
    pub fn default_store() -> Self {
        Self::new(".mimi/jobs")
    }

    fn path_for(&self, job_id: &JobId) -> PathBuf {
        self.root.join(format!("{}.job.toml", job_id.file_stem()))
    }

    pub fn save(&self, record: &JobRecord) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.path_for(&record.job_id);

        let wrapper = JobFile {
            job: record.clone(),
        };
        let content = toml::to_string_pretty(&wrapper)?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    pub fn load(&self, job_id: &JobId) -> Result<JobRecord> {
        let path = self.path_for(job_id);
        if !path.exists() {
            return Err(MimiError::Configuration(format!(
                "No local record for job {}",
                job_id
            )));
        }

        let content = std::fs::read_to_string(&path)?;
        let file: JobFile = toml::from_str(&content)?;
        Ok(file.job)
    }

    /// All recorded jobs, newest first. Unreadable files are skipped.
    pub fn list(&self) -> Result<Vec<JobRecord>> {
        let mut jobs = Vec::new();

        if !self.root.exists() {
            return Ok(jobs);
        }

        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            let is_job_file = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(".job.toml"))
                .unwrap_or(false);
            if !is_job_file {
                continue;
            }

            let content = std::fs::read_to_string(&path)?;
            match toml::from_str::<JobFile>(&content) {
                Ok(file) => jobs.push(file.job),
                Err(e) => log::warn!("skipping unreadable job record {}: {}", path.display(), e),
            }
        }

        jobs.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(jobs)
    }
}

#[derive(Serialize, Deserialize)]
struct JobFile {
    job: JobRecord,
}
