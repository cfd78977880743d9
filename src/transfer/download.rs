//! Single-stream download path
//!
//! Fetches one object and streams it to the local destination. The body is
//! written to a temp file created next to the destination and only renamed
//! into place once fully written, so a failed download never leaves a
//! partial file behind: the destination either keeps its previous state or
//! holds the complete object.

use std::path::Path;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::info;

use crate::config::ObjectLocator;
use crate::error::ClassifiedError;
use crate::s3::S3Connection;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Download `remote` to `local_path`, overwriting an existing file
#[tracing::instrument(
    name = "transfer.download",
    skip(conn, remote, local_path),
    fields(
        s3.bucket = %remote.bucket,
        s3.key = %remote.key,
        path = %local_path.display()
    ),
    err
)]
pub async fn download(
    conn: &S3Connection,
    remote: &ObjectLocator,
    local_path: &Path,
) -> Result<(), ClassifiedError> {
    let response = conn
        .client()
        .get_object()
        .bucket(&remote.bucket)
        .key(&remote.key)
        .send()
        .await
        .map_err(|e| ClassifiedError::from_sdk_error("Get object", &e))?;

    let expected_len = response.content_length();

    // Temp file in the destination directory keeps the final rename on one
    // filesystem, so it is atomic
    let parent = local_path.parent().unwrap_or_else(|| Path::new("."));
    let temp = tempfile::Builder::new()
        .prefix(".s3ferry-")
        .tempfile_in(parent)
        .map_err(|e| ClassifiedError::local_io(local_path, &e))?;
    let (temp_file, temp_path) = temp.into_parts();
    let mut file = tokio::fs::File::from_std(temp_file);

    let mut body = response.body.into_async_read();
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut bytes_written: u64 = 0;

    loop {
        let n = body
            .read(&mut buffer)
            .await
            .map_err(|e| ClassifiedError::unknown(format!("Download stream failed: {e}")))?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n])
            .await
            .map_err(|e| ClassifiedError::local_io(local_path, &e))?;
        bytes_written += n as u64;
    }

    file.flush()
        .await
        .map_err(|e| ClassifiedError::local_io(local_path, &e))?;
    drop(file);

    // A stream that ends early without erroring must not persist a short file
    if let Some(expected) = expected_len {
        if expected >= 0 && bytes_written != expected as u64 {
            return Err(ClassifiedError::unknown(format!(
                "Download stream truncated: got {bytes_written} of {expected} bytes"
            )));
        }
    }

    temp_path
        .persist(local_path)
        .map_err(|e| ClassifiedError::local_io(local_path, &e.error))?;

    info!(bytes = bytes_written, "Download completed");
    Ok(())
}
