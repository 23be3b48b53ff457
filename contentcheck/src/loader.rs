//! Loading content files into [`ContentDocument`]s.
//!
//! [`ContentLoader`] is the seam between the pipeline and the file system.
//! The filesystem implementation reads files with a bounded read so a single
//! oversized file cannot exhaust memory.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::document::ContentDocument;
use crate::error::ContentError;

/// Default maximum file size (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10_485_760;

/// Read access to repository files, addressed by repository-relative path.
pub trait ContentLoader {
    /// Raw bytes of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn read_bytes(&self, path: &str) -> Result<Vec<u8>, ContentError>;

    /// Whether `path` exists as a regular file.
    fn exists(&self, path: &str) -> bool;

    /// UTF-8 content of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not UTF-8.
    fn read_text(&self, path: &str) -> Result<String, ContentError> {
        String::from_utf8(self.read_bytes(path)?).map_err(|_| ContentError::InvalidEncoding {
            path: path.to_owned(),
        })
    }

    /// Parsed YAML/JSON document at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    fn load(&self, path: &str) -> Result<ContentDocument, ContentError> {
        parse_document(path, &self.read_text(path)?)
    }
}

/// Parse `content` as YAML or JSON depending on the extension of `path`.
///
/// # Errors
///
/// Returns an error for unsupported extensions, malformed content, or a
/// document whose root is not a mapping.
pub fn parse_document(path: &str, content: &str) -> Result<ContentDocument, ContentError> {
    let extension = Path::new(path)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .map(str::to_ascii_lowercase);

    let value: Value = match extension.as_deref() {
        Some("yml" | "yaml") => {
            serde_saphyr::from_str(content).map_err(|e| ContentError::parse(path, e))?
        }
        Some("json") => serde_json::from_str(content).map_err(|e| ContentError::parse(path, e))?,
        _ => {
            return Err(ContentError::UnsupportedExtension {
                path: path.to_owned(),
            });
        }
    };

    if !value.is_object() {
        return Err(ContentError::parse(path, "document root is not a mapping"));
    }
    Ok(ContentDocument::new(path, value))
}

/// Loads files relative to a repository root on disk.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
    max_file_size: u64,
}

impl FsLoader {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    #[must_use]
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentLoader for FsLoader {
    /// Uses `Read::take` so the size check and the read are one operation.
    fn read_bytes(&self, path: &str) -> Result<Vec<u8>, ContentError> {
        let io_err = |source| ContentError::Io {
            path: path.to_owned(),
            source,
        };
        let file = std::fs::File::open(self.root.join(path)).map_err(io_err)?;

        let mut buffer = Vec::new();
        file.take(self.max_file_size + 1)
            .read_to_end(&mut buffer)
            .map_err(io_err)?;

        if buffer.len() as u64 > self.max_file_size {
            return Err(ContentError::TooLarge {
                path: path.to_owned(),
                limit: self.max_file_size,
            });
        }
        Ok(buffer)
    }

    fn exists(&self, path: &str) -> bool {
        self.root.join(path).is_file()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_yaml_document() {
        let doc = parse_document("Scripts/script-a.yml", "name: a\ntype: python\n").unwrap();
        assert_eq!(doc.name(), Some("a"));
    }

    #[test]
    fn test_parse_json_document() {
        let doc = parse_document("Layouts/layout-a.json", r#"{"id": "a", "version": -1}"#).unwrap();
        assert_eq!(doc.id(), Some("a"));
    }

    #[test]
    fn test_parse_rejects_non_mapping_root() {
        let err = parse_document("a.yml", "- 1\n- 2\n").unwrap_err();
        assert!(matches!(err, ContentError::Parse { .. }), "got: {err}");
    }

    #[test]
    fn test_parse_rejects_unknown_extension() {
        let err = parse_document("a.txt", "x").unwrap_err();
        assert!(matches!(err, ContentError::UnsupportedExtension { .. }));
    }

    #[test]
    fn test_parse_malformed_json() {
        let err = parse_document("a.json", "{not json").unwrap_err();
        assert!(matches!(err, ContentError::Parse { .. }));
    }

    #[test]
    fn test_fs_loader_reads_relative_to_root() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("Scripts")).unwrap();
        std::fs::write(tmp.path().join("Scripts/script-a.yml"), "name: a\n").unwrap();

        let loader = FsLoader::new(tmp.path());
        assert!(loader.exists("Scripts/script-a.yml"));
        assert!(!loader.exists("Scripts/script-b.yml"));
        assert_eq!(loader.load("Scripts/script-a.yml").unwrap().name(), Some("a"));
    }

    #[test]
    fn test_fs_loader_enforces_size_limit() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("big.yml"), "name: aaaaaaaaaaaaaaaa\n").unwrap();

        let loader = FsLoader::new(tmp.path()).with_max_file_size(4);
        let err = loader.read_bytes("big.yml").unwrap_err();
        assert!(matches!(err, ContentError::TooLarge { limit: 4, .. }));
    }

    #[test]
    fn test_fs_loader_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = FsLoader::new(tmp.path()).load("missing.yml").unwrap_err();
        assert!(matches!(err, ContentError::Io { .. }));
    }
}
