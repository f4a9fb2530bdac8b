//! Presentation seam
//!
//! The submitter, stream consumer and session never print directly. They hand
//! what happened to a [`Reporter`]; the CLI plugs in [`TerminalReporter`] and
//! tests plug in recorders.

use mimi_core::JobId;
use std::io::{self, Write};

use crate::job::JobHandle;
use crate::request::ImageInput;

/// Marker the service puts in front of a progress message that closes a stage
pub const STAGE_COMPLETE_MARKER: &str = "[STAGE_COMPLETE]";

/// What one stream event should look like to the user
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// A stage finished; text has the marker stripped
    StageCompleted(String),
    /// First sighting of a `client_status` in this session
    StageStarted(String),
    /// Any other progress message, shown low-priority
    Log(String),
    Completed {
        total_duration: Option<f64>,
        message: String,
        download_links: Vec<String>,
    },
    ServerError(String),
    /// A line that did not decode, or carried an unknown status
    Raw(String),
    /// Progress event with nothing new to show
    Quiet,
}

/// Receives lifecycle and stream output
pub trait Reporter {
    fn image(&mut self, image: &ImageInput) -> io::Result<()>;

    fn submitting(&mut self, endpoint: &str) -> io::Result<()>;

    fn job_started(&mut self, handle: &JobHandle) -> io::Result<()>;

    fn reconnecting(&mut self, job_id: &JobId) -> io::Result<()>;

    fn stream_opened(&mut self, url: &str) -> io::Result<()>;

    fn notice(&mut self, notice: &Notice) -> io::Result<()>;

    /// The server closed the stream without a success event
    fn stream_closed(&mut self, job_id: &JobId) -> io::Result<()>;
}

const CYAN: &str = "\x1b[96m";
const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";
const RED: &str = "\x1b[91m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Human-readable terminal output with optional ANSI colour
pub struct TerminalReporter<W: Write> {
    out: W,
    color: bool,
    program: String,
}

impl TerminalReporter<io::Stdout> {
    pub fn stdout(color: bool) -> Self {
        Self::new(io::stdout(), color)
    }
}

impl<W: Write> TerminalReporter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            program: "mimi".to_string(),
        }
    }

    /// Program name used in the printed reconnect command
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, codes: &[&str], text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("{}{}{}", codes.concat(), text, RESET)
    }
}

impl<W: Write> Reporter for TerminalReporter<W> {
    fn image(&mut self, image: &ImageInput) -> io::Result<()> {
        match image {
            ImageInput::None => writeln!(self.out, "No image provided, using text-only generation"),
            ImageInput::Missing(path) => {
                let line = format!(
                    "Warning: Image not found at {}, proceeding without image",
                    path.display()
                );
                let line = self.paint(&[YELLOW], &line);
                writeln!(self.out, "{}", line)
            }
            ImageInput::Embedded { path, bytes, .. } => writeln!(
                self.out,
                "Using image: {} ({} bytes)",
                path.display(),
                bytes.len()
            ),
        }
    }

    fn submitting(&mut self, endpoint: &str) -> io::Result<()> {
        writeln!(self.out, "Sending request to {}...", endpoint)
    }

    fn job_started(&mut self, handle: &JobHandle) -> io::Result<()> {
        let command = handle.reconnect_command(&self.program);
        let width = command.chars().count() + 4;
        let rule = "=".repeat(width);
        let credits = handle.credits_remaining.as_deref().unwrap_or("unknown");

        writeln!(self.out)?;
        let lines = [
            rule.clone(),
            format!("  Job started! ID: {}", handle.job_id),
            format!("  Credits remaining: {}", credits),
            format!(
                "  ({} credit(s) will be deducted upon completion)",
                handle.batch_size
            ),
            rule,
        ];
        for line in &lines {
            let line = self.paint(&[GREEN], line);
            writeln!(self.out, "{}", line)?;
        }

        let heading = self.paint(&[BOLD], "To reconnect later, run:");
        writeln!(self.out, "\n{}", heading)?;
        let top = format!("┌{}┐", "─".repeat(width - 2));
        let middle = format!("│ {} │", command);
        let bottom = format!("└{}┘", "─".repeat(width - 2));
        for line in [top, middle, bottom] {
            let line = self.paint(&[CYAN], &line);
            writeln!(self.out, "{}", line)?;
        }
        writeln!(self.out)
    }

    fn reconnecting(&mut self, job_id: &JobId) -> io::Result<()> {
        writeln!(self.out, "Reconnecting to existing job: {}", job_id)
    }

    fn stream_opened(&mut self, url: &str) -> io::Result<()> {
        writeln!(self.out, "Streaming logs from {}...\n", url)?;
        writeln!(self.out, "--- Real-time Progress ---")
    }

    fn notice(&mut self, notice: &Notice) -> io::Result<()> {
        match notice {
            Notice::StageCompleted(text) => writeln!(self.out, "   ✓ {}", text),
            Notice::StageStarted(stage) => writeln!(self.out, "[SERVER] {}...", stage),
            Notice::Log(text) => {
                let line = self.paint(&[DIM], &format!("   {}", text));
                writeln!(self.out, "{}", line)
            }
            Notice::Completed {
                total_duration,
                message,
                download_links,
            } => {
                let banner = self.paint(&[GREEN, BOLD], "--- Generation Complete ---");
                writeln!(self.out, "\n{}", banner)?;
                if let Some(secs) = total_duration {
                    writeln!(self.out, "Total Time: {:.1}s", secs)?;
                }
                writeln!(self.out, "Message: {}", message)?;
                writeln!(self.out, "Download links:")?;
                for link in download_links {
                    writeln!(self.out, "- {}", link)?;
                }
                Ok(())
            }
            Notice::ServerError(message) => {
                let line = self.paint(&[RED, BOLD], &format!("[ERROR] {}", message));
                writeln!(self.out, "\n{}", line)
            }
            Notice::Raw(line) => writeln!(self.out, "Raw output: {}", line),
            Notice::Quiet => Ok(()),
        }
    }

    fn stream_closed(&mut self, job_id: &JobId) -> io::Result<()> {
        let warning = self.paint(
            &[YELLOW],
            "Stream closed before the job reported completion.",
        );
        writeln!(self.out, "\n{}", warning)?;
        writeln!(
            self.out,
            "Reconnect with: {}",
            JobHandle::reconnect_command_for(&self.program, job_id)
        )
    }
}
