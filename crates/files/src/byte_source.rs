use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use staticship_protocol::ShipError;

/// Where a file's bytes come from.
///
/// The only capability the rest of the client relies on is "can be read
/// fully into memory". [`ByteSource::read_all`] consumes the source, so a
/// source is read at most once.
pub enum ByteSource {
    /// Owned bytes already in memory.
    Buffer(Vec<u8>),
    /// Shared immutable bytes (e.g. handed over by an embedding application).
    Blob(Arc<[u8]>),
    /// A file on disk, read lazily at upload time.
    File(PathBuf),
}

impl ByteSource {
    /// Reads the whole source into memory.
    pub async fn read_all(self) -> Result<Vec<u8>, ShipError> {
        match self {
            Self::Buffer(data) => Ok(data),
            Self::Blob(data) => Ok(data.to_vec()),
            Self::File(path) => tokio::fs::read(&path)
                .await
                .map_err(|e| ShipError::File(format!("{}: {e}", path.display()))),
        }
    }

    /// Length if known without touching the disk.
    pub fn known_len(&self) -> Option<u64> {
        match self {
            Self::Buffer(data) => Some(data.len() as u64),
            Self::Blob(data) => Some(data.len() as u64),
            Self::File(_) => None,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        !matches!(self, Self::File(_))
    }

    /// Returns the in-memory bytes, if any.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Buffer(data) => Some(data),
            Self::Blob(data) => Some(data),
            Self::File(_) => None,
        }
    }
}

impl fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffer(data) => write!(f, "Buffer({} bytes)", data.len()),
            Self::Blob(data) => write!(f, "Blob({} bytes)", data.len()),
            Self::File(path) => write!(f, "File({})", path.display()),
        }
    }
}

impl From<Vec<u8>> for ByteSource {
    fn from(data: Vec<u8>) -> Self {
        Self::Buffer(data)
    }
}

impl From<&[u8]> for ByteSource {
    fn from(data: &[u8]) -> Self {
        Self::Buffer(data.to_vec())
    }
}

impl From<Arc<[u8]>> for ByteSource {
    fn from(data: Arc<[u8]>) -> Self {
        Self::Blob(data)
    }
}

impl From<PathBuf> for ByteSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}
