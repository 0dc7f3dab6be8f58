use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// A file received through `/upload` and moved to its final location.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Form field the file arrived in
    pub field_name: String,
    /// Filename as sent by the client. Untrusted.
    pub original_name: String,
    /// Name the file was stored under
    pub stored_name: String,
    /// Location the bytes were received into
    pub temp_path: PathBuf,
    /// Location the file was moved to
    pub final_path: PathBuf,
    pub size: u64,
    pub received_at: DateTime<Utc>,
}
