use thiserror::Error as ThisError;

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// Failures of the import pipeline and its catalog storage.
///
/// Row-level variants (`PriceParse`, `StoreNotFound`) skip one line and let
/// the batch continue. Everything else rejects the whole request.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("sheet has no recognizable {0} column")]
    MissingColumn(&'static str),

    #[error("line {line}: could not parse {field} '{raw}'")]
    PriceParse {
        line: usize,
        field: &'static str,
        raw: String,
    },

    #[error("no categories exist; create one before adding products")]
    NoCategoryAvailable,

    #[error("line {line}: store '{store}' not found")]
    StoreNotFound { line: usize, store: String },

    #[error("category {0} not found")]
    CategoryNotFound(i64),

    #[error("chunk {index} is out of range for an upload of {total} chunks")]
    ChunkOutOfRange { index: usize, total: usize },

    #[error("upload {upload_id} was started with {expected} chunks, chunk claims {got}")]
    ChunkCountMismatch {
        upload_id: String,
        expected: usize,
        got: usize,
    },

    #[error("chunk {index} of upload {upload_id} was already received with different content")]
    ChunkConflict { upload_id: String, index: usize },

    #[error("upload {0} expired before all chunks arrived")]
    UploadExpired(String),

    #[error("upload {upload_id} incomplete: {received} of {total} chunks received")]
    IncompleteUpload {
        upload_id: String,
        received: usize,
        total: usize,
    },

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl Error {
    /// Sheet line the failure belongs to, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::PriceParse { line, .. } | Self::StoreNotFound { line, .. } => Some(*line),
            Self::Csv(e) => e.position().map(|p| p.line() as usize),
            _ => None,
        }
    }

    /// True for failures that only affect a single sheet row.
    pub fn is_row_level(&self) -> bool {
        matches!(
            self,
            Self::PriceParse { .. } | Self::StoreNotFound { .. } | Self::Csv(_)
        )
    }
}

/// Failures of the chunk transport between the upload client and handler.
#[derive(Debug, ThisError)]
pub enum TransportError {
    /// The request may not have arrived; safe to send again.
    #[error("network error: {0}")]
    Network(String),

    /// The handler received the request and refused it.
    #[error(transparent)]
    Rejected(#[from] Error),
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
