use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Target chunk length in characters.
pub(crate) const CHUNK_SIZE: usize = 50_000;

/// Split `content` into pieces of at most `target` characters, never inside
/// a UTF-8 sequence. Empty content is one empty chunk.
pub(crate) fn split_into_chunks(content: &str, target: usize) -> Vec<&str> {
    let target = target.max(1);
    let mut chunks = Vec::with_capacity(content.len() / target + 1);
    let mut start = 0;
    for (count, (idx, _)) in content.char_indices().enumerate() {
        if count > 0 && count % target == 0 {
            chunks.push(&content[start..idx]);
            start = idx;
        }
    }
    chunks.push(&content[start..]);
    chunks
}

/// Chunks received so far for one upload, keyed by index.
#[derive(Debug)]
pub(crate) struct ChunkAssembler {
    upload_id: String,
    total: usize,
    chunks: BTreeMap<usize, String>,
    last_activity: Instant,
}

impl ChunkAssembler {
    pub(crate) fn new(upload_id: String, total: usize, now: Instant) -> Result<Self> {
        if total == 0 {
            return Err(Error::ChunkOutOfRange { index: 0, total });
        }
        Ok(Self {
            upload_id,
            total,
            chunks: BTreeMap::new(),
            last_activity: now,
        })
    }

    /// Store chunk `index`. Returns `Ok(false)` for a repeat of a chunk
    /// already held with the same content.
    pub(crate) fn insert(
        &mut self,
        index: usize,
        total: usize,
        content: String,
        now: Instant,
    ) -> Result<bool> {
        if total != self.total {
            return Err(Error::ChunkCountMismatch {
                upload_id: self.upload_id.clone(),
                expected: self.total,
                got: total,
            });
        }
        if index >= self.total {
            return Err(Error::ChunkOutOfRange {
                index,
                total: self.total,
            });
        }

        self.last_activity = now;
        match self.chunks.get(&index) {
            Some(existing) if *existing == content => Ok(false),
            Some(_) => Err(Error::ChunkConflict {
                upload_id: self.upload_id.clone(),
                index,
            }),
            None => {
                self.chunks.insert(index, content);
                Ok(true)
            }
        }
    }

    pub(crate) fn received(&self) -> usize {
        self.chunks.len()
    }

    pub(crate) fn total(&self) -> usize {
        self.total
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.chunks.len() == self.total
    }

    pub(crate) fn is_stale(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_activity) > timeout
    }

    /// Concatenate the chunks in index order. The chunks stay held, so a
    /// failed import can be retried from the same session.
    pub(crate) fn assemble(&self) -> Result<String> {
        if !self.is_complete() {
            return Err(Error::IncompleteUpload {
                upload_id: self.upload_id.clone(),
                received: self.chunks.len(),
                total: self.total,
            });
        }
        Ok(self.chunks.values().map(String::as_str).collect())
    }
}

#[cfg(test)]
#[path = "chunks_tests.rs"]
mod tests;
