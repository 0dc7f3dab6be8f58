use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Mode of stored uploads. Temp files start out as 0600.
#[cfg(unix)]
const STORED_FILE_MODE: u32 = 0o644;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create temporary file in {}: {source}", .dir.display())]
    CreateTemp { dir: PathBuf, source: io::Error },

    #[error("Failed to read upload body: {0}")]
    Read(#[source] io::Error),

    #[error("Failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    Persist {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

/// Bytes of one upload written to a temporary file, not yet moved into
/// place. Dropping it removes the temporary file.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    size: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Streams `reader` into a fresh temporary file.
    async fn stage<'a>(
        &self,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<StagedFile, StorageError>;

    /// Moves a staged file to `stored_name` inside the upload directory,
    /// replacing whatever is there. `stored_name` must already be sanitized.
    async fn commit(&self, staged: StagedFile, stored_name: &str) -> Result<PathBuf, StorageError>;

    /// Final location for `stored_name`.
    fn destination(&self, stored_name: &str) -> PathBuf;

    async fn is_writable(&self) -> bool;
}

/// Stores uploads in a directory on the local filesystem.
pub struct LocalStorageService {
    upload_dir: PathBuf,
    temp_dir: PathBuf,
}

impl LocalStorageService {
    pub fn new(upload_dir: impl Into<PathBuf>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            temp_dir: temp_dir.into(),
        }
    }

    /// Creates the upload and temp directories if they are missing.
    pub async fn setup(
        upload_dir: impl Into<PathBuf>,
        temp_dir: impl Into<PathBuf>,
    ) -> io::Result<Self> {
        let service = Self::new(upload_dir, temp_dir);
        tokio::fs::create_dir_all(&service.upload_dir).await?;
        tokio::fs::create_dir_all(&service.temp_dir).await?;
        Ok(service)
    }
}

#[async_trait]
impl StorageService for LocalStorageService {
    async fn stage<'a>(
        &self,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<StagedFile, StorageError> {
        let temp = tempfile::Builder::new()
            .prefix(".upload-")
            .tempfile_in(&self.temp_dir)
            .map_err(|source| StorageError::CreateTemp {
                dir: self.temp_dir.clone(),
                source,
            })?;
        let (file, path) = temp.into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let write_error = |source| StorageError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
        let mut size = 0u64;
        loop {
            let n = reader.read(&mut buffer).await.map_err(StorageError::Read)?;
            if n == 0 {
                break;
            }
            file.write_all(&buffer[..n]).await.map_err(write_error)?;
            size += n as u64;
        }
        file.flush().await.map_err(write_error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(STORED_FILE_MODE))
                .await
                .map_err(write_error)?;
        }
        drop(file);

        Ok(StagedFile { path, size })
    }

    async fn commit(&self, staged: StagedFile, stored_name: &str) -> Result<PathBuf, StorageError> {
        let destination = self.destination(stored_name);
        let StagedFile { path, .. } = staged;

        match tokio::fs::rename(&path, &destination).await {
            Ok(()) => {
                // Nothing left at the temp path to clean up.
                let _ = path.keep();
                Ok(destination)
            }
            Err(source) => Err(StorageError::Persist {
                from: path.to_path_buf(),
                to: destination,
                source,
            }),
        }
    }

    fn destination(&self, stored_name: &str) -> PathBuf {
        self.upload_dir.join(stored_name)
    }

    /// Creates and removes a scratch file in the upload directory.
    async fn is_writable(&self) -> bool {
        let dir = self.upload_dir.clone();
        tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(".health-")
                .tempfile_in(&dir)
                .is_ok()
        })
        .await
        .unwrap_or(false)
    }
}
