//! Job request construction and the JSON body sent to the service

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::ImageFormat;
use mimi_core::{ContentDigest, MimiError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The reference image for a job.
///
/// Three distinct cases: nothing was asked for, a path was given but does
/// not exist (submission continues text-only with a warning), or the file
/// was read and will be embedded.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageInput {
    None,
    Missing(PathBuf),
    Embedded {
        path: PathBuf,
        bytes: Vec<u8>,
        format: Option<ImageFormat>,
    },
}

impl ImageInput {
    /// Resolve an optional path. The literal `none` (any case) means no image.
    pub fn from_path(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) if !p.as_os_str().to_string_lossy().eq_ignore_ascii_case("none") => p,
            _ => return Ok(ImageInput::None),
        };

        if !path.exists() {
            log::warn!("image not found at {}, continuing without it", path.display());
            return Ok(ImageInput::Missing(path.to_path_buf()));
        }

        let bytes = std::fs::read(path)?;
        let format = image::guess_format(&bytes).ok();
        match format {
            Some(f) => log::debug!("embedding {:?} image {} ({} bytes)", f, path.display(), bytes.len()),
            None => log::warn!(
                "{} does not look like a known image format; sending it anyway",
                path.display()
            ),
        }

        Ok(ImageInput::Embedded {
            path: path.to_path_buf(),
            bytes,
            format,
        })
    }

    /// Base64 of the exact file bytes, when an image is embedded
    pub fn to_base64(&self) -> Option<String> {
        match self {
            ImageInput::Embedded { bytes, .. } => Some(BASE64.encode(bytes)),
            _ => None,
        }
    }

    pub fn digest(&self) -> Option<ContentDigest> {
        match self {
            ImageInput::Embedded { bytes, .. } => Some(ContentDigest::of(bytes)),
            _ => None,
        }
    }
}

/// A request to start one generation job. Immutable once built.
#[derive(Debug, Clone)]
pub struct JobRequest {
    prompt: String,
    target: String,
    batch_size: u32,
    image: ImageInput,
}

impl JobRequest {
    /// Build a request. The `{TARGET}` placeholder is left for the server;
    /// only the batch size is checked here (it must be at least 1).
    pub fn new(
        prompt: impl Into<String>,
        target: impl Into<String>,
        batch_size: u32,
        image: ImageInput,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(MimiError::Configuration(
                "batch size must be a positive integer".to_string(),
            ));
        }
        Ok(Self {
            prompt: prompt.into(),
            target: target.into(),
            batch_size,
            image,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    pub fn image(&self) -> &ImageInput {
        &self.image
    }

    pub fn payload(&self) -> SubmitPayload<'_> {
        SubmitPayload {
            prompt: &self.prompt,
            target: &self.target,
            batch_size: self.batch_size,
            image_base64: self.image.to_base64(),
        }
    }
}

/// JSON body of `POST /v1/end2end-asset-gen`
#[derive(Debug, Serialize)]
pub struct SubmitPayload<'a> {
    pub prompt: &'a str,
    pub target: &'a str,
    pub batch_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}
