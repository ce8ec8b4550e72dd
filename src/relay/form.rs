//! Inbound multipart decoding.
//!
//! The whole body is decoded before anything is forwarded, so a malformed
//! submission never reaches the webhook. Uploaded bytes are buffered in
//! memory and owned by the [`InboundForm`]; dropping the form releases them.

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::Bytes;
use tracing::debug;

use crate::error::RelayError;

// =============================================================================
// Keyed Collections
// =============================================================================

/// Entries grouped by form key.
///
/// Keys keep the order they first appeared in; entries under a key keep
/// submission order.
#[derive(Debug, Clone)]
struct Grouped<T> {
    groups: Vec<(String, Vec<T>)>,
}

impl<T> Grouped<T> {
    fn new() -> Self {
        Self { groups: Vec::new() }
    }

    fn push(&mut self, key: &str, value: T) -> usize {
        match self.groups.iter_mut().find(|(k, _)| k == key) {
            Some((_, values)) => {
                values.push(value);
                values.len() - 1
            }
            None => {
                self.groups.push((key.to_string(), vec![value]));
                0
            }
        }
    }

    fn get(&self, key: &str) -> Option<&[T]> {
        self.groups
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &[T])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    fn len(&self) -> usize {
        self.groups.len()
    }
}

/// Text fields of a submission: key to one or more values.
#[derive(Debug, Clone)]
pub struct FieldMap {
    inner: Grouped<String>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self {
            inner: Grouped::new(),
        }
    }

    /// Record a value under `key`, after any earlier values.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.inner.push(key, value.into());
    }

    /// All values submitted under `key`, in submission order.
    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.inner.get(key)
    }

    /// The first value submitted under `key`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.values(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Iterate keys with their values, keys in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.inner.iter()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FieldMap {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Files
// =============================================================================

/// A single uploaded file.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Client-supplied filename, if any (empty names are treated as absent)
    pub original_name: Option<String>,

    /// Client-supplied MIME type, if any
    pub mime_type: Option<String>,

    /// Form key the file was submitted under
    pub field_name: String,

    /// Zero-based position within the key's file list
    pub index: usize,

    /// File contents
    pub data: Bytes,
}

impl FileEntry {
    /// Size of the file in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Uploaded files of a submission: key to one or more file entries.
#[derive(Debug, Clone)]
pub struct FileMap {
    inner: Grouped<FileEntry>,
}

impl FileMap {
    pub fn new() -> Self {
        Self {
            inner: Grouped::new(),
        }
    }

    /// Append a file under `key`, assigning its per-key index.
    pub fn insert(
        &mut self,
        key: &str,
        original_name: Option<String>,
        mime_type: Option<String>,
        data: Bytes,
    ) {
        let index = self.inner.get(key).map_or(0, <[FileEntry]>::len);
        self.inner.push(
            key,
            FileEntry {
                original_name: original_name.filter(|name| !name.is_empty()),
                mime_type,
                field_name: key.to_string(),
                index,
                data,
            },
        );
    }

    /// Files submitted under `key`, in submission order.
    pub fn files(&self, key: &str) -> Option<&[FileEntry]> {
        self.inner.get(key)
    }

    /// Iterate every file, grouped by key in first-appearance order.
    pub fn entries(&self) -> impl Iterator<Item = &FileEntry> {
        self.inner.iter().flat_map(|(_, files)| files.iter())
    }

    /// Total number of files across all keys.
    pub fn file_count(&self) -> usize {
        self.inner.iter().map(|(_, files)| files.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.file_count() == 0
    }
}

impl Default for FileMap {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Inbound Form
// =============================================================================

/// A fully decoded multipart submission.
#[derive(Debug, Clone, Default)]
pub struct InboundForm {
    pub fields: FieldMap,
    pub files: FileMap,
}

impl InboundForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every part of a multipart body.
    ///
    /// A part is treated as a file when it carries a filename or its own
    /// content type; everything else is a UTF-8 text field.
    pub async fn from_multipart(
        mut multipart: Multipart,
        body_limit: usize,
    ) -> Result<Self, RelayError> {
        let mut form = Self::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, body_limit))?
        {
            form.read_field(field, body_limit).await?;
        }

        debug!(
            fields = form.fields.len(),
            files = form.files.file_count(),
            "Decoded multipart form"
        );

        Ok(form)
    }

    async fn read_field(&mut self, field: Field<'_>, body_limit: usize) -> Result<(), RelayError> {
        let key = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        if file_name.is_some() || content_type.is_some() {
            let data = field
                .bytes()
                .await
                .map_err(|e| multipart_error(e, body_limit))?;
            self.files.insert(&key, file_name, content_type, data);
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| multipart_error(e, body_limit))?;
            self.fields.insert(&key, value);
        }

        Ok(())
    }
}

fn multipart_error(err: MultipartError, limit: usize) -> RelayError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        RelayError::PayloadTooLarge { limit }
    } else {
        RelayError::InvalidForm(err.body_text())
    }
}

// =============================================================================
// Tests
// =============================================================================
