//! Error taxonomy and classification
//!
//! Every failure the transfer can hit — store-side rejections, transport
//! problems, local file trouble, bad parameters — is mapped onto a small set
//! of actionable kinds. Classification is a total function: anything it does
//! not recognize becomes [`ErrorKind::UnknownError`], and classifying never
//! fails or panics itself.
//!
//! The mapping from S3 error codes mirrors what operators see from MinIO and
//! AWS S3: `InvalidAccessKeyId`, `InvalidEndpoint` and `SignatureDoesNotMatch`
//! each get their own kind; every other coded response is a `ClientError`.

use std::fmt;
use std::io;
use std::path::Path;

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// Categories a failure can classify into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Store rejected the access key id
    InvalidCredentials,
    /// Endpoint address unreachable or malformed
    InvalidEndpoint,
    /// Secret key mismatch (request signing rejected)
    InvalidSignature,
    /// Any other store-side error response carrying an error code
    ClientError,
    /// Unrecognized failure (malformed response, missing error code, ...)
    UnknownError,
    /// `state` parameter outside {upload, download}
    InvalidDirection,
    /// Local file could not be opened, read or written
    LocalIoError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidCredentials => "InvalidCredentials",
            ErrorKind::InvalidEndpoint => "InvalidEndpoint",
            ErrorKind::InvalidSignature => "InvalidSignature",
            ErrorKind::ClientError => "ClientError",
            ErrorKind::UnknownError => "UnknownError",
            ErrorKind::InvalidDirection => "InvalidDirection",
            ErrorKind::LocalIoError => "LocalIoError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure mapped onto the [`ErrorKind`] taxonomy
///
/// Carries the kind plus the operator-facing message text. The message is
/// what ends up in the result record; raw SDK debug output never leaks
/// through unformatted.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Fallback classification for anything unrecognized
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownError, message)
    }

    /// Fatal configuration error for a `state` outside {upload, download}
    pub fn invalid_direction(state: &str) -> Self {
        Self::new(
            ErrorKind::InvalidDirection,
            format!("invalid state {state}: only upload or download is supported"),
        )
    }

    /// Classify a local filesystem failure
    pub fn local_io(path: &Path, err: &io::Error) -> Self {
        Self::new(
            ErrorKind::LocalIoError,
            format!("Local I/O error for {}: {err}", path.display()),
        )
    }

    /// Classify an S3 SDK failure from operation `op`
    ///
    /// Dispatch failures and transport timeouts mean the endpoint could not
    /// be reached and classify as [`ErrorKind::InvalidEndpoint`]. Service
    /// responses classify by their error code. Everything else (response
    /// decoding, client construction) is the unknown fallback.
    pub fn from_sdk_error<E>(op: &str, err: &SdkError<E>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
    {
        match err {
            SdkError::ServiceError(ctx) => {
                let service_err = ctx.err();
                match service_err.code() {
                    Some(code) => {
                        let detail = service_err
                            .message()
                            .unwrap_or("no error message from store");
                        Self::new(kind_for_code(code), format!("{op} failed ({code}): {detail}"))
                    }
                    None => Self::unknown(format!(
                        "{op} failed with an uncoded store response: {}",
                        DisplayErrorContext(err)
                    )),
                }
            }
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => Self::new(
                ErrorKind::InvalidEndpoint,
                format!("{op} failed: {}", DisplayErrorContext(err)),
            ),
            _ => Self::unknown(format!("{op} failed: {}", DisplayErrorContext(err))),
        }
    }
}

/// Map an S3 error code onto the taxonomy
///
/// The three specially recognized codes get their own kinds; any other code
/// is a recognized client error.
pub(crate) fn kind_for_code(code: &str) -> ErrorKind {
    match code {
        "InvalidAccessKeyId" => ErrorKind::InvalidCredentials,
        "InvalidEndpoint" => ErrorKind::InvalidEndpoint,
        "SignatureDoesNotMatch" => ErrorKind::InvalidSignature,
        _ => ErrorKind::ClientError,
    }
}
