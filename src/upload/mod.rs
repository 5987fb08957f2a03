//! Chunked upload protocol between a client and the import pipeline.
//!
//! Large sheets travel as numbered chunks tagged with an upload id. The
//! handler buffers them per upload, drops duplicates, rejects uploads that
//! stall, and runs the import once every chunk is present.

mod chunks;
mod client;
mod handler;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::pipeline::ImportSummary;
use crate::reconcile::MissingProduct;

pub(crate) use chunks::{split_into_chunks, ChunkAssembler, CHUNK_SIZE};
pub(crate) use client::{Transport, UploadClient};
pub(crate) use handler::{LocalTransport, UploadHandler};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadRequest {
    pub(crate) filename: String,
    pub(crate) content_type: String,
    pub(crate) file_content: String,
    pub(crate) week_of: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) chunk_data: Option<ChunkData>,
}

impl UploadRequest {
    pub(crate) fn whole(filename: &str, week_of: NaiveDate, content: &str) -> Self {
        Self {
            filename: filename.to_string(),
            content_type: "text/csv".into(),
            file_content: content.to_string(),
            week_of,
            chunk_data: None,
        }
    }
}

/// Position of one chunk within an upload. `(upload_id, chunk_index)` is the
/// idempotency key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChunkData {
    pub(crate) upload_id: String,
    pub(crate) chunk_index: usize,
    pub(crate) total_chunks: usize,
    pub(crate) is_last_chunk: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub(crate) enum UploadResponse {
    Completed(ImportSummary),
    Pending(UploadProgress),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadProgress {
    pub(crate) upload_id: String,
    pub(crate) received_chunks: usize,
    pub(crate) total_chunks: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MissingProductsResponse {
    pub(crate) missing_products: Vec<MissingProduct>,
}
