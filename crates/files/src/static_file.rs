use staticship_protocol::ShipError;

use crate::byte_source::ByteSource;
use crate::checksum::md5_hex;

/// One file of a deploy batch.
#[derive(Debug)]
pub struct StaticFile {
    /// Forward-slash relative path, used as the upload key.
    pub path: String,
    pub content: ByteSource,
    /// Size in bytes as reported by whoever produced the record.
    pub size: i64,
    /// Content hash, computed upstream and treated as opaque.
    pub md5: String,
    /// Set when the file could not be read or hashed upstream.
    pub processing_error: Option<String>,
}

impl StaticFile {
    pub fn new(path: impl Into<String>, content: ByteSource, size: i64, md5: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content,
            size,
            md5: md5.into(),
            processing_error: None,
        }
    }

    /// Builds an in-memory file, computing size and MD5 from `data`.
    pub fn from_bytes(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        let md5 = md5_hex(&data);
        let size = data.len() as i64;
        Self::new(path, ByteSource::Buffer(data), size, md5)
    }

    /// A placeholder for a file that failed upstream. Validation treats it as
    /// fatal for the whole batch.
    pub fn failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: ByteSource::Buffer(Vec::new()),
            size: 0,
            md5: String::new(),
            processing_error: Some(reason.into()),
        }
    }

    /// Final path segment.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Pulls the content into memory in place and returns it.
    ///
    /// Lets a caller inspect a file (SPA detection reads `index.html`)
    /// without consuming the source that will later be uploaded. On a read
    /// error the source is left untouched.
    pub async fn materialize(&mut self) -> Result<&[u8], ShipError> {
        if let ByteSource::File(path) = &self.content {
            let data = tokio::fs::read(path)
                .await
                .map_err(|e| ShipError::File(format!("{}: {e}", path.display())))?;
            self.content = ByteSource::Buffer(data);
        }
        // In-memory variants always yield a slice.
        Ok(self.content.as_bytes().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_fills_size_and_hash() {
        let f = StaticFile::from_bytes("a/b.txt", b"abc".to_vec());
        assert_eq!(f.size, 3);
        assert_eq!(f.md5, "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(f.name(), "b.txt");
        assert!(f.processing_error.is_none());
    }

    #[test]
    fn name_without_directory() {
        let f = StaticFile::from_bytes("index.html", b"x".to_vec());
        assert_eq!(f.name(), "index.html");
    }

    #[tokio::test]
    async fn materialize_reads_file_once_and_keeps_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(&path, b"<html></html>").unwrap();

        let mut f = StaticFile::new("index.html", ByteSource::File(path.clone()), 13, "x");
        assert_eq!(f.materialize().await.unwrap(), b"<html></html>");

        // The disk copy can disappear; the file now carries its own bytes.
        std::fs::remove_file(&path).unwrap();
        assert!(f.content.is_in_memory());
        assert_eq!(f.content.read_all().await.unwrap(), b"<html></html>");
    }

    #[tokio::test]
    async fn materialize_failure_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.html");

        let mut f = StaticFile::new("index.html", ByteSource::File(path.clone()), 13, "x");
        let err = f.materialize().await.unwrap_err();
        assert_eq!(err.kind(), staticship_protocol::ErrorKind::File);

        match &f.content {
            ByteSource::File(p) => assert_eq!(p, &path),
            other => panic!("source replaced: {other:?}"),
        }
    }
}
