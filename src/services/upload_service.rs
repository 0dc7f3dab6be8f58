use crate::config::CommitMode;
use crate::models::UploadedFile;
use crate::services::storage::{StagedFile, StorageError, StorageService};
use crate::utils::validation::{ValidationError, sanitize_filename};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{source}")]
    InvalidFilename {
        filename: String,
        #[source]
        source: ValidationError,
    },

    #[error("{source}")]
    Storage {
        filename: String,
        #[source]
        source: StorageError,
    },

    #[error("Malformed upload body: {0}")]
    Body(#[source] StorageError),
}

impl UploadError {
    /// Client-supplied name of the file the error belongs to, if any.
    pub fn filename(&self) -> Option<&str> {
        match self {
            UploadError::InvalidFilename { filename, .. } | UploadError::Storage { filename, .. } => {
                Some(filename)
            }
            UploadError::Body(_) => None,
        }
    }
}

pub struct UploadService {
    storage: Arc<dyn StorageService>,
    mode: CommitMode,
}

impl UploadService {
    pub fn new(storage: Arc<dyn StorageService>, mode: CommitMode) -> Self {
        Self { storage, mode }
    }

    pub fn storage(&self) -> &Arc<dyn StorageService> {
        &self.storage
    }

    /// Starts collecting the files of one request.
    pub fn begin(&self) -> UploadBatch<'_> {
        UploadBatch {
            service: self,
            pending: Vec::new(),
            stored: Vec::new(),
            last_error: None,
        }
    }
}

struct PendingFile {
    field_name: String,
    original_name: String,
    stored_name: String,
    staged: StagedFile,
    received_at: DateTime<Utc>,
}

/// Files of a single upload request.
///
/// Per-file failures never abort the batch; only the most recent one is
/// kept and reported by [`UploadBatch::finish`].
pub struct UploadBatch<'a> {
    service: &'a UploadService,
    pending: Vec<PendingFile>,
    stored: Vec<UploadedFile>,
    last_error: Option<UploadError>,
}

#[derive(Debug)]
pub struct BatchReport {
    pub stored: Vec<UploadedFile>,
    pub error: Option<UploadError>,
}

impl UploadBatch<'_> {
    /// Receives one file part.
    ///
    /// Returns `Err` only when the request body itself could not be read;
    /// the caller should stop processing the request then.
    pub async fn receive<'r>(
        &mut self,
        field_name: &str,
        original_name: &str,
        reader: Box<dyn AsyncRead + Unpin + Send + 'r>,
    ) -> Result<(), UploadError> {
        let stored_name = match sanitize_filename(original_name) {
            Ok(name) => name,
            Err(source) => {
                warn!("Rejected upload {:?}: {}", original_name, source);
                self.record(UploadError::InvalidFilename {
                    filename: original_name.to_string(),
                    source,
                });
                return Ok(());
            }
        };

        let staged = match self.service.storage.stage(reader).await {
            Ok(staged) => staged,
            Err(e @ StorageError::Read(_)) => return Err(UploadError::Body(e)),
            Err(source) => {
                error!("Failed to receive {:?}: {}", original_name, source);
                self.record(UploadError::Storage {
                    filename: original_name.to_string(),
                    source,
                });
                return Ok(());
            }
        };

        let file = PendingFile {
            field_name: field_name.to_string(),
            original_name: original_name.to_string(),
            stored_name,
            staged,
            received_at: Utc::now(),
        };

        match self.service.mode {
            CommitMode::BestEffort => {
                self.commit(file).await;
            }
            CommitMode::Atomic => self.pending.push(file),
        }
        Ok(())
    }

    /// Moves any files still pending and reports the outcome.
    pub async fn finish(mut self) -> BatchReport {
        let pending = std::mem::take(&mut self.pending);

        if self.last_error.is_some() {
            if !pending.is_empty() {
                warn!("Discarding {} received file(s) of a failed batch", pending.len());
            }
        } else {
            let mut files = pending.into_iter();
            while let Some(file) = files.next() {
                if !self.commit(file).await {
                    if files.len() > 0 {
                        warn!("Discarding {} received file(s) of a failed batch", files.len());
                    }
                    break;
                }
            }
        }

        BatchReport {
            stored: self.stored,
            error: self.last_error,
        }
    }

    async fn commit(&mut self, file: PendingFile) -> bool {
        let temp_path = file.staged.path().to_path_buf();
        let size = file.staged.size();

        match self
            .service
            .storage
            .commit(file.staged, &file.stored_name)
            .await
        {
            Ok(final_path) => {
                info!(
                    field = %file.field_name,
                    size,
                    "Stored {:?} as {}",
                    file.original_name,
                    final_path.display()
                );
                self.stored.push(UploadedFile {
                    field_name: file.field_name,
                    original_name: file.original_name,
                    stored_name: file.stored_name,
                    temp_path,
                    final_path,
                    size,
                    received_at: file.received_at,
                });
                true
            }
            Err(source) => {
                error!("Failed to store {:?}: {}", file.original_name, source);
                self.record(UploadError::Storage {
                    filename: file.original_name,
                    source,
                });
                false
            }
        }
    }

    fn record(&mut self, error: UploadError) {
        self.last_error = Some(error);
    }
}
