use chrono::NaiveDate;
use std::time::Duration;

use super::{split_into_chunks, ChunkData, UploadRequest, UploadResponse};
use crate::error::{Error, TransportError};
use crate::pipeline::ImportSummary;

/// Carries one request to an upload handler.
pub(crate) trait Transport {
    fn send(&mut self, request: &UploadRequest) -> Result<UploadResponse, TransportError>;
}

pub(crate) trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub(crate) struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Waits between attempts. One entry per retry, so the default makes four
/// attempts in total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    pub(crate) delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delays: vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ],
        }
    }
}

/// Send `request`, retrying network failures with the policy's delays.
/// Rejections are returned at once.
pub(crate) fn send_with_retry<T, S>(
    transport: &mut T,
    sleeper: &S,
    policy: &RetryPolicy,
    request: &UploadRequest,
) -> Result<UploadResponse, TransportError>
where
    T: Transport + ?Sized,
    S: Sleeper + ?Sized,
{
    let mut delays = policy.delays.iter();
    loop {
        let err = match transport.send(request) {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };
        match delays.next() {
            Some(delay) if err.is_retryable() => {
                log::warn!("upload request failed ({err}); retrying in {delay:?}");
                sleeper.sleep(*delay);
            }
            _ => return Err(err),
        }
    }
}

/// Sends sheets in chunks, each chunk retried on its own.
pub(crate) struct UploadClient<T, S = ThreadSleeper> {
    transport: T,
    sleeper: S,
    policy: RetryPolicy,
    chunk_size: usize,
}

impl<T: Transport> UploadClient<T> {
    pub(crate) fn new(transport: T, chunk_size: usize) -> Self {
        Self::with_sleeper(transport, ThreadSleeper, chunk_size)
    }
}

impl<T: Transport, S: Sleeper> UploadClient<T, S> {
    pub(crate) fn with_sleeper(transport: T, sleeper: S, chunk_size: usize) -> Self {
        Self {
            transport,
            sleeper,
            policy: RetryPolicy::default(),
            chunk_size,
        }
    }

    /// Upload `content` chunk by chunk and return the summary the final
    /// chunk produced.
    pub(crate) fn upload(
        &mut self,
        filename: &str,
        week_of: NaiveDate,
        content: &str,
    ) -> Result<ImportSummary, TransportError> {
        let upload_id = upload_id(filename, week_of, content);
        let chunks = split_into_chunks(content, self.chunk_size);
        let total = chunks.len();
        log::info!("uploading {filename} as {total} chunk(s), upload id {upload_id}");

        let mut last = None;
        for (index, chunk) in chunks.into_iter().enumerate() {
            let request = UploadRequest {
                chunk_data: Some(ChunkData {
                    upload_id: upload_id.clone(),
                    chunk_index: index,
                    total_chunks: total,
                    is_last_chunk: index + 1 == total,
                }),
                ..UploadRequest::whole(filename, week_of, chunk)
            };
            last = Some(send_with_retry(
                &mut self.transport,
                &self.sleeper,
                &self.policy,
                &request,
            )?);
        }

        match last {
            Some(UploadResponse::Completed(summary)) => Ok(summary),
            Some(UploadResponse::Pending(progress)) => {
                Err(TransportError::Rejected(Error::IncompleteUpload {
                    upload_id: progress.upload_id,
                    received: progress.received_chunks,
                    total: progress.total_chunks,
                }))
            }
            None => Err(TransportError::Rejected(Error::IncompleteUpload {
                upload_id,
                received: 0,
                total,
            })),
        }
    }

    /// Upload `content` as a single request.
    pub(crate) fn upload_whole(
        &mut self,
        filename: &str,
        week_of: NaiveDate,
        content: &str,
    ) -> Result<ImportSummary, TransportError> {
        let request = UploadRequest::whole(filename, week_of, content);
        match send_with_retry(&mut self.transport, &self.sleeper, &self.policy, &request)? {
            UploadResponse::Completed(summary) => Ok(summary),
            UploadResponse::Pending(progress) => {
                Err(TransportError::Rejected(Error::IncompleteUpload {
                    upload_id: progress.upload_id,
                    received: progress.received_chunks,
                    total: progress.total_chunks,
                }))
            }
        }
    }
}

/// Unique id for one upload attempt of a file.
fn upload_id(filename: &str, week_of: NaiveDate, content: &str) -> String {
    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default();
    let input = format!("{filename}|{week_of}|{nanos}|{content}");
    format!("{:016x}", fnv1a(input.as_bytes()))
}

fn fnv1a(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
