//! Multipart upload path
//!
//! Streams a local file into the store as a multipart upload: chunk
//! boundaries are computed once from the file size, then up to
//! `concurrency` parts are in flight at a time, each worker claiming one
//! unsent chunk, reading exactly its byte range and sending one
//! `UploadPart`. The upload completes only after every part is acknowledged;
//! the first part failure cancels the remaining in-flight parts and aborts
//! the whole upload so no partial object becomes visible.

use std::io::SeekFrom;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info, warn};

use crate::config::{ObjectLocator, TransferConfig};
use crate::error::{ClassifiedError, ErrorKind};
use crate::s3::S3Connection;

/// Hard S3 ceiling on parts per multipart upload
pub const MAX_PARTS: u64 = 10_000;

/// One chunk's immutable boundaries within the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkSpec {
    /// 1-based, as the store numbers parts
    pub part_number: i32,
    pub offset: u64,
    pub len: u64,
}

/// Compute the chunk boundaries for a file
///
/// Produces `ceil(file_size / part_size)` chunks; every chunk is
/// `part_size` bytes except the last, which takes the remainder. A
/// zero-length file yields no chunks.
pub(crate) fn plan_chunks(file_size: u64, part_size: u64) -> Vec<ChunkSpec> {
    if file_size == 0 {
        return Vec::new();
    }

    let count = file_size.div_ceil(part_size);
    (0..count)
        .map(|i| {
            let offset = i * part_size;
            ChunkSpec {
                part_number: (i + 1) as i32,
                offset,
                len: part_size.min(file_size - offset),
            }
        })
        .collect()
}

/// Upload `local_path` to `remote` as a chunked, concurrent multipart upload
#[tracing::instrument(
    name = "transfer.upload",
    skip(conn, local_path, remote, config),
    fields(
        s3.bucket = %remote.bucket,
        s3.key = %remote.key,
        path = %local_path.display()
    ),
    err
)]
pub async fn upload(
    conn: &S3Connection,
    local_path: &Path,
    remote: &ObjectLocator,
    config: &TransferConfig,
) -> Result<(), ClassifiedError> {
    // The source must open before anything touches the network
    let file = File::open(local_path)
        .await
        .map_err(|e| ClassifiedError::local_io(local_path, &e))?;
    let metadata = file
        .metadata()
        .await
        .map_err(|e| ClassifiedError::local_io(local_path, &e))?;
    let file_size = metadata.len();
    drop(file); // workers open their own handles

    let part_size = config.part_size_bytes();
    let plan = plan_chunks(file_size, part_size);

    if plan.is_empty() {
        return put_empty_object(conn, remote).await;
    }
    if plan.len() as u64 > MAX_PARTS {
        return Err(ClassifiedError::new(
            ErrorKind::ClientError,
            format!(
                "upload needs {} parts, above the store's {MAX_PARTS} part limit; raise the chunk size",
                plan.len()
            ),
        ));
    }

    let create = conn
        .client()
        .create_multipart_upload()
        .bucket(&remote.bucket)
        .key(&remote.key)
        .send()
        .await
        .map_err(|e| ClassifiedError::from_sdk_error("Create multipart upload", &e))?;

    let upload_id = match create.upload_id() {
        Some(id) => id.to_string(),
        None => {
            return Err(ClassifiedError::unknown(
                "Create multipart upload returned no upload id",
            ))
        }
    };

    info!(
        upload_id = %upload_id,
        parts = plan.len(),
        part_size,
        file_size,
        "Starting multipart upload"
    );

    let total_parts = plan.len();
    let parts_done = Arc::new(AtomicUsize::new(0));

    let mut in_flight = stream::iter(plan)
        .map(|chunk| {
            let client = conn.client().clone();
            let bucket = remote.bucket.clone();
            let key = remote.key.clone();
            let upload_id = upload_id.clone();
            let local_path = local_path.to_path_buf();
            let parts_done = Arc::clone(&parts_done);

            async move {
                let body = read_chunk(&local_path, chunk).await?;

                let response = client
                    .upload_part()
                    .bucket(&bucket)
                    .key(&key)
                    .upload_id(&upload_id)
                    .part_number(chunk.part_number)
                    .body(ByteStream::from(body))
                    .send()
                    .await
                    .map_err(|e| {
                        ClassifiedError::from_sdk_error(
                            &format!("Upload part {}", chunk.part_number),
                            &e,
                        )
                    })?;

                let etag = match response.e_tag() {
                    Some(tag) => tag.to_string(),
                    None => {
                        return Err(ClassifiedError::unknown(format!(
                            "no ETag returned for part {}",
                            chunk.part_number
                        )))
                    }
                };

                let acked = parts_done.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(
                    part_number = chunk.part_number,
                    bytes = chunk.len,
                    acked,
                    "Part acknowledged"
                );

                Ok(CompletedPart::builder()
                    .part_number(chunk.part_number)
                    .e_tag(etag)
                    .build())
            }
        })
        .buffer_unordered(config.concurrency.max(1));

    let mut completed: Vec<CompletedPart> = Vec::with_capacity(total_parts);
    while let Some(part) = in_flight.next().await {
        match part {
            Ok(part) => completed.push(part),
            Err(err) => {
                // Dropping the stream cancels the parts still in flight
                drop(in_flight);
                abort_upload(conn, remote, &upload_id).await;
                return Err(err);
            }
        }
    }

    // Every chunk must be acknowledged before the store assembles the object
    if completed.len() != total_parts {
        abort_upload(conn, remote, &upload_id).await;
        return Err(ClassifiedError::unknown(format!(
            "only {} of {total_parts} parts acknowledged",
            completed.len()
        )));
    }

    // The store requires ascending part order on completion
    completed.sort_by_key(|p| p.part_number());

    let completed_upload = CompletedMultipartUpload::builder()
        .set_parts(Some(completed))
        .build();

    let complete = conn
        .client()
        .complete_multipart_upload()
        .bucket(&remote.bucket)
        .key(&remote.key)
        .upload_id(&upload_id)
        .multipart_upload(completed_upload)
        .send()
        .await;

    if let Err(err) = complete {
        let classified = ClassifiedError::from_sdk_error("Complete multipart upload", &err);
        abort_upload(conn, remote, &upload_id).await;
        return Err(classified);
    }

    info!(
        upload_id = %upload_id,
        parts = total_parts,
        bytes = file_size,
        "Multipart upload completed"
    );

    Ok(())
}

/// Read one chunk's exact byte range from the source file
async fn read_chunk(path: &Path, chunk: ChunkSpec) -> Result<Bytes, ClassifiedError> {
    let mut file = File::open(path)
        .await
        .map_err(|e| ClassifiedError::local_io(path, &e))?;
    file.seek(SeekFrom::Start(chunk.offset))
        .await
        .map_err(|e| ClassifiedError::local_io(path, &e))?;

    let mut buffer = vec![0u8; chunk.len as usize];
    file.read_exact(&mut buffer)
        .await
        .map_err(|e| ClassifiedError::local_io(path, &e))?;

    Ok(Bytes::from(buffer))
}

/// Create a zero-length object with a single PutObject
///
/// Multipart needs at least one part, so an empty source cannot go through
/// it; the store must still end up with the object.
async fn put_empty_object(
    conn: &S3Connection,
    remote: &ObjectLocator,
) -> Result<(), ClassifiedError> {
    conn.client()
        .put_object()
        .bucket(&remote.bucket)
        .key(&remote.key)
        .body(ByteStream::from_static(b""))
        .send()
        .await
        .map_err(|e| ClassifiedError::from_sdk_error("Put empty object", &e))?;

    info!("Uploaded empty object");
    Ok(())
}

/// Abort the multipart upload so no partial object stays visible
///
/// Abort failure is logged rather than returned; the part error that led
/// here is the one the caller needs to see.
async fn abort_upload(conn: &S3Connection, remote: &ObjectLocator, upload_id: &str) {
    let result = conn
        .client()
        .abort_multipart_upload()
        .bucket(&remote.bucket)
        .key(&remote.key)
        .upload_id(upload_id)
        .send()
        .await;

    match result {
        Ok(_) => warn!(upload_id = %upload_id, "Multipart upload aborted"),
        Err(err) => warn!(
            upload_id = %upload_id,
            error = %DisplayErrorContext(&err),
            "Failed to abort multipart upload"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn test_plan_even_split() {
        let plan = plan_chunks(10 * MIB, 5 * MIB);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].part_number, 1);
        assert_eq!(plan[0].offset, 0);
        assert_eq!(plan[0].len, 5 * MIB);
        assert_eq!(plan[1].part_number, 2);
        assert_eq!(plan[1].offset, 5 * MIB);
        assert_eq!(plan[1].len, 5 * MIB);
    }

    #[test]
    fn test_plan_count_is_ceiling_of_size_over_part_size() {
        assert_eq!(plan_chunks(10 * MIB + 1, 5 * MIB).len(), 3);
        assert_eq!(plan_chunks(10 * MIB - 1, 5 * MIB).len(), 2);
        assert_eq!(plan_chunks(5 * MIB, 5 * MIB).len(), 1);
        assert_eq!(plan_chunks(1, 5 * MIB).len(), 1);
    }

    #[test]
    fn test_plan_last_chunk_takes_the_remainder() {
        let plan = plan_chunks(10 * MIB + 1, 5 * MIB);
        assert_eq!(plan[2].offset, 10 * MIB);
        assert_eq!(plan[2].len, 1);
    }

    #[test]
    fn test_plan_empty_file_has_no_chunks() {
        assert!(plan_chunks(0, 5 * MIB).is_empty());
    }

    #[test]
    fn test_plan_chunks_are_contiguous_and_cover_the_file() {
        let size = 17 * MIB + 311;
        let plan = plan_chunks(size, 4 * MIB);

        let mut expected_offset = 0;
        for (i, chunk) in plan.iter().enumerate() {
            assert_eq!(chunk.part_number, (i + 1) as i32);
            assert_eq!(chunk.offset, expected_offset);
            expected_offset += chunk.len;
        }
        assert_eq!(expected_offset, size);
    }

    #[test]
    fn test_plan_single_short_file() {
        let plan = plan_chunks(9, 5 * MIB);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].len, 9);
    }
}
