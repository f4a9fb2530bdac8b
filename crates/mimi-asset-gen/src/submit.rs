//! Job submission
//!
//! One POST, no retries. The server is authoritative on limits, so a
//! rejected request is surfaced with its status and body and the run ends.

use mimi_core::{JobId, MimiError, Result};

use crate::client::ApiClient;
use crate::job::JobHandle;
use crate::report::Reporter;
use crate::request::JobRequest;

/// Starts jobs against one service
pub struct JobSubmitter<'a> {
    client: &'a ApiClient,
}

impl<'a> JobSubmitter<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Submit `request` and return the handle for the accepted job
    pub fn submit(
        &self,
        api_key: &str,
        request: &JobRequest,
        reporter: &mut dyn Reporter,
    ) -> Result<JobHandle> {
        reporter.image(request.image())?;

        let endpoint = self.client.submit_url();
        reporter.submitting(&endpoint)?;

        let reply = self
            .client
            .post_json(&endpoint, api_key, &request.payload())
            .map_err(|e| e.into_submission_error())?;

        let handle = parse_submit_response(&reply.body, request.batch_size())?;
        log::debug!("job {} accepted", handle.job_id);
        reporter.job_started(&handle)?;
        Ok(handle)
    }
}

/// Interpret a success body. `job_id` must be a non-empty string; the
/// credit and batch echoes are optional and only displayed.
pub fn parse_submit_response(body: &str, requested_batch_size: u32) -> Result<JobHandle> {
    let protocol_error = |message: &str| MimiError::SubmissionProtocol {
        message: message.to_string(),
        body: Some(body.to_string()),
    };

    let response: serde_json::Value =
        serde_json::from_str(body).map_err(|e| protocol_error(&format!("invalid JSON: {}", e)))?;

    let job_id = response
        .get("job_id")
        .and_then(|id| id.as_str())
        .and_then(JobId::new)
        .ok_or_else(|| protocol_error("no job_id in response"))?;

    let credits_remaining = response
        .get("credits_remaining")
        .and_then(|credits| match credits {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        });

    let batch_size = response
        .get("batch_size")
        .and_then(|b| b.as_u64())
        .and_then(|b| u32::try_from(b).ok())
        .unwrap_or(requested_batch_size);

    Ok(JobHandle {
        job_id,
        credits_remaining,
        batch_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::RecordingReporter;
    use crate::request::ImageInput;
    use crate::testing::{CannedResponse, CannedServer};
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use std::path::PathBuf;

    #[test]
    fn test_parse_minimal_response() {
        let handle = parse_submit_response(r#"{"job_id":"abc123"}"#, 1).unwrap();
        assert_eq!(handle.job_id.as_str(), "abc123");
        assert_eq!(handle.credits_remaining, None);
        assert_eq!(handle.batch_size, 1);
    }

    #[test]
    fn test_issued_job_id_is_not_altered() {
        let handle = parse_submit_response(r#"{"job_id":"abc123 "}"#, 1).unwrap();
        assert_eq!(handle.job_id.as_str(), "abc123 ");
    }

    #[test]
    fn test_parse_full_response() {
        let handle = parse_submit_response(
            r#"{"job_id":"abc123","credits_remaining":17.5,"batch_size":4}"#,
            1,
        )
        .unwrap();
        assert_eq!(handle.credits_remaining.as_deref(), Some("17.5"));
        assert_eq!(handle.batch_size, 4);
    }

    #[test]
    fn test_parse_string_credits() {
        let handle =
            parse_submit_response(r#"{"job_id":"j","credits_remaining":"unlimited"}"#, 2).unwrap();
        assert_eq!(handle.credits_remaining.as_deref(), Some("unlimited"));
        assert_eq!(handle.batch_size, 2);
    }

    #[test]
    fn test_parse_rejects_missing_or_invalid_job_id() {
        for body in [
            r#"{"credits_remaining":3}"#,
            r#"{"job_id":""}"#,
            r#"{"job_id":42}"#,
            r#"{"job_id":null}"#,
            "<html>gateway</html>",
        ] {
            match parse_submit_response(body, 1) {
                Err(MimiError::SubmissionProtocol { body: Some(b), .. }) => assert_eq!(b, body),
                other => panic!("expected protocol error for {}, got {:?}", body, other),
            }
        }
    }

    #[test]
    fn test_submit_text_only_scenario() {
        let server = CannedServer::start(vec![CannedResponse::json(200, r#"{"job_id":"abc123"}"#)]);
        let client = ApiClient::new(&server.base_url());
        let request = JobRequest::new("Generate {TARGET}", "apple", 1, ImageInput::None).unwrap();
        let mut reporter = RecordingReporter::default();

        let handle = JobSubmitter::new(&client)
            .submit("sk-live", &request, &mut reporter)
            .unwrap();
        assert_eq!(handle.job_id.as_str(), "abc123");

        let requests = server.finish();
        let body = requests[0].json();
        assert_eq!(body["target"], "apple");
        assert_eq!(body["batch_size"], 1);
        assert!(body.get("image_base64").is_none());
        assert_eq!(requests[0].header("Authorization"), Some("Bearer sk-live"));

        assert_eq!(reporter.images, vec![ImageInput::None]);
        assert_eq!(reporter.endpoints, vec![client.submit_url()]);
        assert_eq!(reporter.started, vec![handle]);
    }

    #[test]
    fn test_submit_embeds_image_bytes() {
        let bytes: Vec<u8> = (0u8..=255).cycle().take(4096).collect();
        let dir = std::env::temp_dir().join(format!("mimi_submit_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("reference.jpg");
        std::fs::write(&path, &bytes).unwrap();

        let server = CannedServer::start(vec![CannedResponse::json(
            200,
            r#"{"job_id":"img-1","credits_remaining":9,"batch_size":2}"#,
        )]);
        let client = ApiClient::new(&server.base_url());
        let image = ImageInput::from_path(Some(&path)).unwrap();
        let request = JobRequest::new("p", "mug", 2, image).unwrap();

        let handle = JobSubmitter::new(&client)
            .submit("k", &request, &mut RecordingReporter::default())
            .unwrap();
        assert_eq!(handle.credits_remaining.as_deref(), Some("9"));

        let body = server.finish()[0].json();
        let decoded = BASE64.decode(body["image_base64"].as_str().unwrap()).unwrap();
        assert_eq!(decoded, bytes);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_image_warns_and_submits_text_only() {
        let missing = PathBuf::from("/definitely/not/here.png");
        let server = CannedServer::start(vec![CannedResponse::json(200, r#"{"job_id":"t"}"#)]);
        let client = ApiClient::new(&server.base_url());
        let image = ImageInput::from_path(Some(&missing)).unwrap();
        let request = JobRequest::new("p", "rock", 1, image).unwrap();
        let mut reporter = RecordingReporter::default();

        JobSubmitter::new(&client)
            .submit("k", &request, &mut reporter)
            .unwrap();

        assert_eq!(reporter.images, vec![ImageInput::Missing(missing)]);
        assert!(server.finish()[0].json().get("image_base64").is_none());
    }

    #[test]
    fn test_non_success_status_surfaces_body_without_retry() {
        let server = CannedServer::start(vec![CannedResponse::json(
            402,
            r#"{"detail":"Insufficient credits"}"#,
        )]);
        let client = ApiClient::new(&server.base_url());
        let request = JobRequest::new("p", "t", 1, ImageInput::None).unwrap();
        let mut reporter = RecordingReporter::default();

        let err = JobSubmitter::new(&client)
            .submit("k", &request, &mut reporter)
            .unwrap_err();
        assert!(matches!(err, MimiError::SubmissionTransport { .. }));
        assert_eq!(err.status(), Some(402));
        assert_eq!(err.response_body(), Some(r#"{"detail":"Insufficient credits"}"#));
        assert!(reporter.started.is_empty());

        // Exactly one request was made
        assert_eq!(server.finish().len(), 1);
    }

    #[test]
    fn test_success_without_job_id_is_protocol_error() {
        let server = CannedServer::start(vec![CannedResponse::json(200, r#"{"status":"queued"}"#)]);
        let client = ApiClient::new(&server.base_url());
        let request = JobRequest::new("p", "t", 1, ImageInput::None).unwrap();

        let err = JobSubmitter::new(&client)
            .submit("k", &request, &mut RecordingReporter::default())
            .unwrap_err();
        assert!(matches!(err, MimiError::SubmissionProtocol { .. }));
        server.finish();
    }
}
