//! Single-page-app detection support.
//!
//! When the API classifies a batch as an SPA, a `ship.json` that rewrites
//! every route to `/index.html` is appended to the upload.

use staticship_files::StaticFile;
use staticship_protocol::constants::{INDEX_HTML, SPA_CONFIG_FILENAME};
use staticship_protocol::{ShipError, SpaCheckRequest};

/// Content of the generated config. Byte-stable so its MD5 never changes.
pub const SPA_REWRITE_CONFIG: &str =
    r#"{"rewrites":[{"source":"/(.*)","destination":"/index.html"}]}"#;

/// The generated rewrite config as an uploadable file.
pub fn spa_config_file() -> StaticFile {
    StaticFile::from_bytes(SPA_CONFIG_FILENAME, SPA_REWRITE_CONFIG.as_bytes().to_vec())
}

/// Detection only makes sense with a root `index.html` and no config yet.
pub fn should_detect(files: &[StaticFile]) -> bool {
    let has_index = files.iter().any(|f| f.path == INDEX_HTML);
    let has_config = files.iter().any(|f| f.path == SPA_CONFIG_FILENAME);
    has_index && !has_config
}

/// Builds the `/spa-check` body: every path plus the text of `index.html`.
///
/// `index.html` is pulled into memory so it can still be uploaded afterwards.
pub async fn check_request(files: &mut [StaticFile]) -> Result<SpaCheckRequest, ShipError> {
    let paths = files.iter().map(|f| f.path.clone()).collect();

    let index = match files.iter_mut().find(|f| f.path == INDEX_HTML) {
        Some(file) => Some(String::from_utf8_lossy(file.materialize().await?).into_owned()),
        None => None,
    };

    Ok(SpaCheckRequest {
        files: paths,
        index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use staticship_files::{ByteSource, md5_hex};

    #[test]
    fn config_file_is_deterministic() {
        let a = spa_config_file();
        let b = spa_config_file();
        assert_eq!(a.path, "ship.json");
        assert_eq!(a.md5, b.md5);
        assert_eq!(a.md5, md5_hex(SPA_REWRITE_CONFIG.as_bytes()));
        assert_eq!(a.size, SPA_REWRITE_CONFIG.len() as i64);

        let parsed: serde_json::Value = serde_json::from_str(SPA_REWRITE_CONFIG).unwrap();
        assert_eq!(parsed["rewrites"][0]["destination"], "/index.html");
    }

    #[test]
    fn detection_gating() {
        let index = || StaticFile::from_bytes("index.html", b"<html>".to_vec());
        let script = || StaticFile::from_bytes("app.js", b"1".to_vec());

        assert!(should_detect(&[index(), script()]));
        assert!(!should_detect(&[script()]));
        assert!(!should_detect(&[index(), spa_config_file()]));
        // Only a root index counts.
        assert!(!should_detect(&[StaticFile::from_bytes(
            "docs/index.html",
            b"<html>".to_vec()
        )]));
    }

    #[tokio::test]
    async fn request_carries_index_text() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = dir.path().join("index.html");
        std::fs::write(&index_path, "<div id=\"root\"></div>").unwrap();

        let mut files = vec![
            StaticFile::new("index.html", ByteSource::File(index_path), 22, "x"),
            StaticFile::from_bytes("app.js", b"1".to_vec()),
        ];
        let req = check_request(&mut files).await.unwrap();

        assert_eq!(req.files, ["index.html", "app.js"]);
        assert_eq!(req.index.as_deref(), Some("<div id=\"root\"></div>"));
        // Materialized in place, still uploadable.
        assert!(files[0].content.is_in_memory());
    }

    #[tokio::test]
    async fn request_without_index() {
        let mut files = vec![StaticFile::from_bytes("app.js", b"1".to_vec())];
        let req = check_request(&mut files).await.unwrap();
        assert!(req.index.is_none());
    }
}
