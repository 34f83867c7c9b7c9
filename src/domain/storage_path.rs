use std::fmt;

use super::document::ContentType;

const METADATA_DIR: &str = "metadata";

/// Slash-separated key addressing a file in a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoragePath(String);

impl StoragePath {
    pub fn new(path: impl Into<String>) -> Self {
        let raw: String = path.into();
        Self(raw.replace('\\', "/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    pub fn content_type(&self) -> ContentType {
        ContentType::from_extension(self.extension().as_deref())
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type() == ContentType::Pdf
    }

    pub fn parent(&self) -> Option<StoragePath> {
        let trimmed = self.0.trim_end_matches('/');
        let (parent, _) = trimmed.rsplit_once('/')?;
        Some(Self(parent.to_string()))
    }

    pub fn join(&self, segment: &str) -> StoragePath {
        if self.0.is_empty() {
            return Self::new(segment);
        }
        Self(format!(
            "{}/{}",
            self.0.trim_end_matches('/'),
            segment.trim_start_matches('/')
        ))
    }

    /// Sibling `metadata/<stem>.json` file that carries extraction metadata
    /// for an extracted-text output.
    pub fn metadata_sidecar(&self) -> StoragePath {
        let name = self.file_name();
        let stem = match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => name,
        };
        let file = format!("{stem}.json");
        match self.parent() {
            Some(parent) => parent.join(METADATA_DIR).join(&file),
            None => Self::new(METADATA_DIR).join(&file),
        }
    }
}

impl From<&str> for StoragePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
