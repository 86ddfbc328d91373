//! Request bodies.
//!
//! Upload bodies are multipart forms with one `files[]` part per file. File
//! contents are read here, once, from whatever [`ByteSource`] backs them.
//!
//! [`ByteSource`]: staticship_files::ByteSource

use reqwest::multipart::{Form, Part};
use staticship_files::StaticFile;
use staticship_protocol::ShipError;
use staticship_protocol::constants::{FILES_FIELD, LABELS_FIELD};
use tracing::debug;

/// Multipart field carrying the JSON array of per-file MD5s, in part order.
pub const CHECKSUMS_FIELD: &str = "checksums";

/// Body of a transport request.
#[derive(Debug)]
pub enum RequestBody {
    Json(serde_json::Value),
    Upload {
        files: Vec<StaticFile>,
        labels: Vec<String>,
    },
}

impl RequestBody {
    pub fn json<T: serde::Serialize>(value: &T) -> Result<Self, ShipError> {
        let value = serde_json::to_value(value).map_err(|e| {
            debug!(error = %e, "request body serialization failed");
            ShipError::unexpected()
        })?;
        Ok(Self::Json(value))
    }
}

/// Builds the multipart form for an upload, consuming each file's source.
pub(crate) async fn upload_form(
    files: Vec<StaticFile>,
    labels: &[String],
) -> Result<Form, ShipError> {
    let mut form = Form::new();
    let mut checksums = Vec::with_capacity(files.len());

    for file in files {
        let data = file.content.read_all().await?;
        debug!(path = %file.path, bytes = data.len(), md5 = %file.md5, "adding upload part");
        checksums.push(file.md5);
        form = form.part(FILES_FIELD, Part::bytes(data).file_name(file.path));
    }

    form = form.text(CHECKSUMS_FIELD, encode_list(&checksums)?);
    if !labels.is_empty() {
        form = form.text(LABELS_FIELD, encode_list(labels)?);
    }
    Ok(form)
}

fn encode_list(items: &[String]) -> Result<String, ShipError> {
    serde_json::to_string(items).map_err(|_| ShipError::unexpected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_body_from_struct() {
        let body = RequestBody::json(&serde_json::json!({"deployment": "abc"})).unwrap();
        match body {
            RequestBody::Json(v) => assert_eq!(v["deployment"], "abc"),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn list_encoding() {
        let labels = vec!["prod".to_string(), "v2".to_string()];
        assert_eq!(encode_list(&labels).unwrap(), r#"["prod","v2"]"#);
    }

    #[tokio::test]
    async fn upload_form_reads_sources() {
        let files = vec![
            StaticFile::from_bytes("index.html", b"<html>".to_vec()),
            StaticFile::from_bytes("app.js", b"1".to_vec()),
        ];
        let form = upload_form(files, &["prod".into()]).await.unwrap();
        assert!(!form.boundary().is_empty());
    }

    #[tokio::test]
    async fn unreadable_source_is_file_error() {
        let file = StaticFile::new(
            "gone.txt",
            staticship_files::ByteSource::File("/nonexistent/staticship/gone.txt".into()),
            3,
            "x",
        );
        let err = upload_form(vec![file], &[]).await.unwrap_err();
        assert_eq!(err.kind(), staticship_protocol::ErrorKind::File);
    }
}
