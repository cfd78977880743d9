//! Parameter value types for a single transfer invocation
//!
//! Everything here is constructed fresh from the host's flat parameter
//! record, used for exactly one transfer attempt, and discarded. Validation
//! happens before any network activity and maps straight onto the
//! [`ErrorKind`](crate::error::ErrorKind) taxonomy, so a bad parameter never
//! costs a round trip.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifiedError, ErrorKind};

// ============================================================================
// Connection profile
// ============================================================================

/// Endpoint, credentials and timeouts for one store connection
///
/// The endpoint is a bare `host:port`; the client always speaks plain HTTP
/// to it (fixed scheme, no negotiation). Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub endpoint_address: String,
    pub access_key: String,
    pub secret_key: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

impl ConnectionProfile {
    /// Build a profile with the default timeouts (connect 10s, read 60s)
    pub fn new(
        endpoint_address: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_address: endpoint_address.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
        }
    }

    /// Check the profile is usable before any network call
    ///
    /// Empty fields classify onto the same kinds the store would answer
    /// with: a blank endpoint is an endpoint problem, a blank access key a
    /// credential problem, a blank secret a signing problem.
    pub fn validate(&self) -> Result<(), ClassifiedError> {
        if self.endpoint_address.trim().is_empty() {
            return Err(ClassifiedError::new(
                ErrorKind::InvalidEndpoint,
                format!("Invalid endpoint: {}", self.endpoint_address),
            ));
        }
        if self.access_key.is_empty() {
            return Err(ClassifiedError::new(
                ErrorKind::InvalidCredentials,
                format!("Invalid access key id: {}", self.access_key),
            ));
        }
        if self.secret_key.is_empty() {
            return Err(ClassifiedError::new(
                ErrorKind::InvalidSignature,
                format!("Invalid signature: {}", self.secret_key),
            ));
        }
        Ok(())
    }

    /// Full endpoint URL with the fixed plain-HTTP scheme prefixed
    ///
    /// A caller that already supplied a scheme keeps it as-is.
    pub fn endpoint_url(&self) -> String {
        if self.endpoint_address.contains("://") {
            self.endpoint_address.clone()
        } else {
            format!("http://{}", self.endpoint_address)
        }
    }
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    60
}

// ============================================================================
// Transfer configuration
// ============================================================================

/// Chunking and concurrency knobs for the upload path
///
/// Download ignores this entirely and uses the store's single-stream
/// retrieval. Both fields must be at least 1; the CLI enforces that at the
/// boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Multipart chunk size in mebibytes
    #[serde(default = "default_chunk_size_mib")]
    pub chunk_size_mib: u64,
    /// Maximum chunk transfers in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl TransferConfig {
    /// Part size in bytes as used on the wire
    pub fn part_size_bytes(&self) -> u64 {
        self.chunk_size_mib * 1024 * 1024
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size_mib: default_chunk_size_mib(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_chunk_size_mib() -> u64 {
    5
}

fn default_concurrency() -> usize {
    10
}

// ============================================================================
// Direction, locator, request
// ============================================================================

/// The two supported transfer directions
///
/// Parsed from the host's `state` parameter. Anything else is a fatal
/// configuration error, rejected before a connection is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    Upload,
    Download,
}

impl FromStr for TransferDirection {
    type Err = ClassifiedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload" => Ok(TransferDirection::Upload),
            "download" => Ok(TransferDirection::Download),
            other => Err(ClassifiedError::invalid_direction(other)),
        }
    }
}

impl std::fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferDirection::Upload => f.write_str("upload"),
            TransferDirection::Download => f.write_str("download"),
        }
    }
}

/// Bucket and key decomposed from a `bucket/key...` remote path
///
/// The first path segment is the bucket, the rest is the object key; keys
/// may themselves contain `/`. Both must be non-empty for a transfer, and
/// violations are caught here rather than sent to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLocator {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocator {
    pub fn parse(remote_path: &str) -> Result<Self, ClassifiedError> {
        let mut segments = remote_path.splitn(2, '/');
        let bucket = segments.next().unwrap_or("");
        let key = segments.next().unwrap_or("");

        if bucket.is_empty() {
            return Err(ClassifiedError::new(
                ErrorKind::ClientError,
                format!("invalid remote path '{remote_path}': bucket name is empty"),
            ));
        }
        if key.is_empty() {
            return Err(ClassifiedError::new(
                ErrorKind::ClientError,
                format!("invalid remote path '{remote_path}': object key is empty"),
            ));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }
}

impl std::fmt::Display for ObjectLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// One fully resolved transfer: direction plus both sides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub direction: TransferDirection,
    /// Local side, absolute path
    pub local_path: PathBuf,
    /// Remote side, already decomposed
    pub remote: ObjectLocator,
}

impl TransferRequest {
    /// Resolve the host's `src`/`dest` pair against the direction
    ///
    /// Upload reads `src` locally and writes to the `dest` locator; download
    /// reads the `src` locator and writes to `dest` locally.
    pub fn from_paths(
        direction: TransferDirection,
        src: &str,
        dest: &str,
    ) -> Result<Self, ClassifiedError> {
        let (local, remote) = match direction {
            TransferDirection::Upload => (src, dest),
            TransferDirection::Download => (dest, src),
        };

        Ok(Self {
            direction,
            local_path: PathBuf::from(local),
            remote: ObjectLocator::parse(remote)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_default_timeouts() {
        let profile = ConnectionProfile::new("127.0.0.1:9000", "ak", "sk");
        assert_eq!(profile.connect_timeout_secs, 10);
        assert_eq!(profile.read_timeout_secs, 60);
    }

    #[test]
    fn test_profile_endpoint_url_gets_http_scheme() {
        let profile = ConnectionProfile::new("127.0.0.1:9000", "ak", "sk");
        assert_eq!(profile.endpoint_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_profile_endpoint_url_keeps_existing_scheme() {
        let profile = ConnectionProfile::new("http://127.0.0.1:9000", "ak", "sk");
        assert_eq!(profile.endpoint_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_profile_validation_maps_empty_fields_onto_taxonomy() {
        let empty_endpoint = ConnectionProfile::new("", "ak", "sk");
        assert_eq!(
            empty_endpoint.validate().unwrap_err().kind,
            ErrorKind::InvalidEndpoint
        );

        let empty_ak = ConnectionProfile::new("127.0.0.1:9000", "", "sk");
        assert_eq!(
            empty_ak.validate().unwrap_err().kind,
            ErrorKind::InvalidCredentials
        );

        let empty_sk = ConnectionProfile::new("127.0.0.1:9000", "ak", "");
        assert_eq!(
            empty_sk.validate().unwrap_err().kind,
            ErrorKind::InvalidSignature
        );
    }

    #[test]
    fn test_transfer_config_defaults() {
        let config = TransferConfig::default();
        assert_eq!(config.chunk_size_mib, 5);
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.part_size_bytes(), 5 * 1024 * 1024);
    }

    #[test]
    fn test_direction_parses_exact_values_only() {
        assert_eq!(
            "upload".parse::<TransferDirection>().unwrap(),
            TransferDirection::Upload
        );
        assert_eq!(
            "download".parse::<TransferDirection>().unwrap(),
            TransferDirection::Download
        );

        let err = "Upload".parse::<TransferDirection>().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidDirection);

        let err = "sync".parse::<TransferDirection>().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidDirection);
    }

    #[test]
    fn test_locator_splits_bucket_from_nested_key() {
        let locator = ObjectLocator::parse("bucketA/dir/a.bin").unwrap();
        assert_eq!(locator.bucket, "bucketA");
        assert_eq!(locator.key, "dir/a.bin");
        assert_eq!(locator.to_string(), "bucketA/dir/a.bin");
    }

    #[test]
    fn test_locator_single_segment_key() {
        let locator = ObjectLocator::parse("bucket/key.bin").unwrap();
        assert_eq!(locator.bucket, "bucket");
        assert_eq!(locator.key, "key.bin");
    }

    #[test]
    fn test_locator_rejects_missing_key() {
        let err = ObjectLocator::parse("bucket-only").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ClientError);

        let err = ObjectLocator::parse("bucket/").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ClientError);
    }

    #[test]
    fn test_locator_rejects_empty_bucket() {
        let err = ObjectLocator::parse("/key").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ClientError);

        let err = ObjectLocator::parse("").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ClientError);
    }

    #[test]
    fn test_request_sides_follow_direction() {
        let upload =
            TransferRequest::from_paths(TransferDirection::Upload, "/tmp/a.bin", "bucketA/dir/a.bin")
                .unwrap();
        assert_eq!(upload.local_path, PathBuf::from("/tmp/a.bin"));
        assert_eq!(upload.remote.bucket, "bucketA");
        assert_eq!(upload.remote.key, "dir/a.bin");

        let download =
            TransferRequest::from_paths(TransferDirection::Download, "bucketA/dir/a.bin", "/tmp/b.bin")
                .unwrap();
        assert_eq!(download.local_path, PathBuf::from("/tmp/b.bin"));
        assert_eq!(download.remote.bucket, "bucketA");
        assert_eq!(download.remote.key, "dir/a.bin");
    }

    #[test]
    fn test_request_invalid_remote_side_is_rejected() {
        let err = TransferRequest::from_paths(TransferDirection::Upload, "/tmp/a.bin", "no-key")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ClientError);
    }
}
