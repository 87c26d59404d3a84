use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::models::error::StoreError;
use crate::models::location_record::LocationRecord;
use crate::storage::codec::{self, DecodedRows};

#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Creates the backing store with its header if it is missing. Safe to
    /// call repeatedly.
    async fn ensure_initialized(&self) -> Result<(), StoreError>;

    async fn append(&self, record: &LocationRecord) -> Result<(), StoreError>;

    /// All stored rows in append order.
    async fn read_all(&self) -> Result<DecodedRows, StoreError>;
}

/// Append-only flat file. There is no locking: concurrent appends rely on the
/// filesystem's append-mode guarantees.
pub struct CsvLocationStore {
    path: PathBuf,
}

impl CsvLocationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the file for appending. Also reports whether the file is new or
    /// empty and so still needs its header.
    async fn open_for_append(&self) -> Result<(File, bool), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| self.open_error(source))?;

        let len = file
            .metadata()
            .await
            .map_err(|source| self.open_error(source))?
            .len();

        Ok((file, len == 0))
    }

    /// Writes `text` in a single append, prefixed by the header when needed.
    /// Racing writers on a fresh file may each add a header; the decoder
    /// skips repeats.
    async fn write_with_header(&self, text: &str) -> Result<(), StoreError> {
        let (mut file, needs_header) = self.open_for_append().await?;
        if !needs_header && text.is_empty() {
            return Ok(());
        }

        let mut buf = String::new();
        if needs_header {
            buf.push_str(&codec::header_line());
            buf.push('\n');
        }
        buf.push_str(text);

        file.write_all(buf.as_bytes())
            .await
            .map_err(|source| self.write_error(source))?;
        file.flush().await.map_err(|source| self.write_error(source))?;

        if needs_header {
            info!("Created locations file with header at {}", self.path.display());
        }
        Ok(())
    }

    fn open_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Open {
            path: self.path.clone(),
            source,
        }
    }

    fn write_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl LocationStore for CsvLocationStore {
    async fn ensure_initialized(&self) -> Result<(), StoreError> {
        self.write_with_header("").await
    }

    async fn append(&self, record: &LocationRecord) -> Result<(), StoreError> {
        let line = format!("{}\n", codec::encode(record));
        self.write_with_header(&line).await?;

        debug!("Appended {} from device {}", record.id, record.device);
        Ok(())
    }

    async fn read_all(&self) -> Result<DecodedRows, StoreError> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(DecodedRows::default()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        Ok(codec::decode_all(&text))
    }
}
