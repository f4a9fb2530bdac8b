//! Mimi Core - Foundational types for the Mimi asset generation client
//!
//! This crate provides the types shared by the library and the CLI:
//! - `JobId` - Opaque server-issued job identifiers
//! - `ContentDigest` - SHA-256 digests for embedded payloads
//! - Error types and Result alias

mod digest;
mod error;
mod id;

pub use digest::ContentDigest;
pub use error::{MimiError, Result};
pub use id::JobId;
