//! s3-ferry Library
//!
//! Single-file transfer primitive for S3-compatible object stores (AWS S3,
//! MinIO, and friends), built to be driven by an external orchestrator:
//! parameters in, structured result out.
//!
//! # Features
//!
//! - **Credential probe**: one cheap `ListBuckets` round trip confirms the
//!   endpoint and credentials before any transfer starts
//! - **Chunked concurrent upload**: multipart with configurable chunk size
//!   and bounded concurrency; a failed part aborts the whole upload
//! - **Safe download**: single-stream retrieval via a temp file, so a failed
//!   download never leaves a partial destination
//! - **Classified failures**: every error maps onto a small actionable
//!   taxonomy instead of raw SDK output
//!
//! # Example
//!
//! ```no_run
//! use s3_ferry::config::{ConnectionProfile, TransferConfig, TransferDirection, TransferRequest};
//! use s3_ferry::transfer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let profile = ConnectionProfile::new("127.0.0.1:9000", "minioadmin", "minioadmin");
//!     let request = TransferRequest::from_paths(
//!         TransferDirection::Upload,
//!         "/tmp/a.bin",
//!         "bucketA/dir/a.bin",
//!     )
//!     .unwrap();
//!
//!     match transfer::run(&profile, &request, &TransferConfig::default()).await {
//!         Ok(result) => println!("{}", result.message),
//!         Err(err) => eprintln!("{}: {}", err.kind, err.message),
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod s3;
pub mod transfer;

// Re-export commonly used types
pub use config::{ConnectionProfile, TransferConfig, TransferDirection, TransferRequest};
pub use error::{ClassifiedError, ErrorKind};
pub use transfer::TransferResult;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
