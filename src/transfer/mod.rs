//! Transfer orchestration
//!
//! Dispatches a validated connection plus a [`TransferRequest`] to the
//! upload or download path and shapes the outcome into a [`TransferResult`].
//! The two directions are the only arms there are; an unrecognized `state`
//! never gets this far.
//!
//! [`run`] is the whole core as one call: validate the profile, execute the
//! request, return the result or the classified failure as a value. The
//! connection is dropped, and its sockets released, when the attempt
//! concludes either way.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{ConnectionProfile, TransferConfig, TransferDirection, TransferRequest};
use crate::error::ClassifiedError;
use crate::s3::{self, S3Connection};

pub mod download;
pub mod multipart;

/// Outcome of one transfer attempt
///
/// Serializes with the host-facing field names: `success` appears as the
/// `changed` flag and `message` as `msg`. `src` and `dest` echo the caller's
/// paths exactly as supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResult {
    #[serde(rename = "changed")]
    pub success: bool,
    #[serde(rename = "msg")]
    pub message: String,
    pub src: String,
    pub dest: String,
}

impl TransferResult {
    pub fn succeeded(
        message: impl Into<String>,
        src: impl Into<String>,
        dest: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            message: message.into(),
            src: src.into(),
            dest: dest.into(),
        }
    }

    pub fn failed(
        message: impl Into<String>,
        src: impl Into<String>,
        dest: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            src: src.into(),
            dest: dest.into(),
        }
    }
}

/// Execute one transfer over an already validated connection
pub async fn execute(
    conn: &S3Connection,
    request: &TransferRequest,
    config: &TransferConfig,
) -> Result<TransferResult, ClassifiedError> {
    info!(direction = %request.direction, "Transfer starting");

    match request.direction {
        TransferDirection::Upload => {
            multipart::upload(conn, &request.local_path, &request.remote, config).await?;
            Ok(TransferResult::succeeded(
                "File uploaded successfully.",
                request.local_path.display().to_string(),
                request.remote.to_string(),
            ))
        }
        TransferDirection::Download => {
            download::download(conn, &request.remote, &request.local_path).await?;
            Ok(TransferResult::succeeded(
                "File downloaded successfully.",
                request.remote.to_string(),
                request.local_path.display().to_string(),
            ))
        }
    }
}

/// Validate the profile, then execute the request
///
/// This is the pure core function the host adapter wraps: everything in,
/// result or classified failure out, nothing raised.
pub async fn run(
    profile: &ConnectionProfile,
    request: &TransferRequest,
    config: &TransferConfig,
) -> Result<TransferResult, ClassifiedError> {
    let conn = s3::validate(profile).await?;
    execute(&conn, request, config).await
}
