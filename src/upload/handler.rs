use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{
    ChunkAssembler, MissingProductsResponse, Transport, UploadProgress, UploadRequest,
    UploadResponse,
};
use crate::db::Database;
use crate::error::{Error, Result, TransportError};
use crate::pipeline::{self, ImportSummary};

/// Receiving side of the upload protocol.
pub(crate) struct UploadHandler {
    timeout: Duration,
    sessions: HashMap<String, ChunkAssembler>,
    /// Finished uploads, so a late duplicate of the final chunk gets the
    /// same answer instead of a second import. Kept for one timeout.
    completed: HashMap<String, (ImportSummary, Instant)>,
    /// Ids dropped by `expire_stale`, with the time they expired. Kept for
    /// one timeout.
    expired: HashMap<String, Instant>,
}

impl UploadHandler {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            sessions: HashMap::new(),
            completed: HashMap::new(),
            expired: HashMap::new(),
        }
    }

    pub(crate) fn handle(
        &mut self,
        db: &mut Database,
        request: UploadRequest,
    ) -> Result<UploadResponse> {
        self.handle_at(db, request, Instant::now())
    }

    fn handle_at(
        &mut self,
        db: &mut Database,
        request: UploadRequest,
        now: Instant,
    ) -> Result<UploadResponse> {
        self.expire_stale(now);

        let Some(chunk) = request.chunk_data else {
            let summary =
                pipeline::run_import(db, &request.filename, request.week_of, &request.file_content)?;
            return Ok(UploadResponse::Completed(summary));
        };

        if let Some((summary, _)) = self.completed.get(&chunk.upload_id) {
            log::debug!(
                "upload {} already imported; ignoring chunk {}",
                chunk.upload_id,
                chunk.chunk_index
            );
            return Ok(UploadResponse::Completed(summary.clone()));
        }
        if self.expired.contains_key(&chunk.upload_id) {
            return Err(Error::UploadExpired(chunk.upload_id));
        }

        let session = match self.sessions.entry(chunk.upload_id.clone()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(ChunkAssembler::new(
                chunk.upload_id.clone(),
                chunk.total_chunks,
                now,
            )?),
        };
        if !session.insert(
            chunk.chunk_index,
            chunk.total_chunks,
            request.file_content,
            now,
        )? {
            log::debug!(
                "duplicate chunk {} of upload {} ignored",
                chunk.chunk_index,
                chunk.upload_id
            );
        }

        if !session.is_complete() {
            if chunk.is_last_chunk {
                log::debug!(
                    "upload {}: last chunk arrived with {} of {} received",
                    chunk.upload_id,
                    session.received(),
                    session.total()
                );
            }
            return Ok(UploadResponse::Pending(UploadProgress {
                upload_id: chunk.upload_id,
                received_chunks: session.received(),
                total_chunks: session.total(),
            }));
        }

        // Removed only once the import succeeds.
        let content = session.assemble()?;
        log::info!(
            "upload {} reassembled from {} chunk(s), {} bytes",
            chunk.upload_id,
            chunk.total_chunks,
            content.len()
        );

        let summary = pipeline::run_import(db, &request.filename, request.week_of, &content)?;
        self.sessions.remove(&chunk.upload_id);
        self.completed.insert(chunk.upload_id, (summary.clone(), now));
        Ok(UploadResponse::Completed(summary))
    }

    /// Products in the request's sheet that are not in the catalog yet.
    pub(crate) fn check_missing(
        &self,
        db: &Database,
        request: &UploadRequest,
    ) -> Result<MissingProductsResponse> {
        Ok(MissingProductsResponse {
            missing_products: pipeline::check_missing(db, &request.file_content)?,
        })
    }

    /// Drop sessions that received nothing for longer than the timeout.
    /// Later chunks of a dropped upload are rejected with `UploadExpired`
    /// for one more timeout. Finished uploads older than the timeout are
    /// forgotten too.
    pub(crate) fn expire_stale(&mut self, now: Instant) -> usize {
        let timeout = self.timeout;
        let outlived = |at: &Instant| now.saturating_duration_since(*at) > timeout;
        self.completed.retain(|_, (_, at)| !outlived(at));
        self.expired.retain(|_, at| !outlived(at));

        let stale: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.is_stale(now, self.timeout))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale {
            if let Some(session) = self.sessions.remove(id) {
                log::warn!(
                    "upload {id} expired with {} of {} chunks",
                    session.received(),
                    session.total()
                );
            }
            self.expired.insert(id.clone(), now);
        }
        stale.len()
    }

    #[cfg(test)]
    pub(crate) fn pending_uploads(&self) -> usize {
        self.sessions.len()
    }

    #[cfg(test)]
    pub(crate) fn remembered_uploads(&self) -> usize {
        self.completed.len() + self.expired.len()
    }
}

/// In-process transport: hands each request straight to a handler.
pub(crate) struct LocalTransport<'a> {
    handler: UploadHandler,
    db: &'a mut Database,
}

impl<'a> LocalTransport<'a> {
    pub(crate) fn new(handler: UploadHandler, db: &'a mut Database) -> Self {
        Self { handler, db }
    }
}

impl Transport for LocalTransport<'_> {
    fn send(&mut self, request: &UploadRequest) -> std::result::Result<UploadResponse, TransportError> {
        Ok(self.handler.handle(self.db, request.clone())?)
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
