//! Outbound envelope construction.
//!
//! The envelope is the multipart body sent to the webhook:
//!
//! ```text
//! formData      {"name":"Alice", ...}                  (exactly one)
//! fileMetadata  {"originalName":..., "index":0}        ┐ one pair per file,
//! binaryFile    <raw bytes>                            ┘ in file order
//! ...
//! ```
//!
//! The Nth `fileMetadata` part describes the Nth `binaryFile` part.

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};

use super::form::{FieldMap, FileEntry, InboundForm};
use crate::error::RelayError;

/// Part name of the serialized field map.
pub const FORM_DATA_FIELD: &str = "formData";

/// Part name shared by every per-file metadata part.
pub const FILE_METADATA_FIELD: &str = "fileMetadata";

/// Part name shared by every binary file part.
pub const BINARY_FILE_FIELD: &str = "binaryFile";

/// MIME type used when a file arrives without one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Description of one relayed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
    pub field_name: String,
    pub index: usize,
}

impl FileMetadata {
    /// Describe a file, defaulting the name to `file-<index>` and the type
    /// to [`DEFAULT_MIME_TYPE`].
    pub fn for_file(file: &FileEntry) -> Self {
        Self {
            original_name: file
                .original_name
                .clone()
                .unwrap_or_else(|| format!("file-{}", file.index)),
            mime_type: file
                .mime_type
                .clone()
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
            size: file.size(),
            field_name: file.field_name.clone(),
            index: file.index,
        }
    }
}

/// A single part of the outbound envelope.
#[derive(Debug, Clone)]
pub enum EnvelopePart {
    /// A plain text part
    Text { name: &'static str, value: String },

    /// A file part with its filename and content type
    Binary {
        name: &'static str,
        file_name: String,
        mime_type: String,
        data: Bytes,
    },
}

impl EnvelopePart {
    pub fn name(&self) -> &'static str {
        match self {
            EnvelopePart::Text { name, .. } | EnvelopePart::Binary { name, .. } => *name,
        }
    }
}

/// The reconstructed multipart body sent downstream.
#[derive(Debug, Clone)]
pub struct Envelope {
    parts: Vec<EnvelopePart>,
}

impl Envelope {
    /// Build the envelope for a decoded submission.
    pub fn from_form(form: InboundForm) -> Result<Self, RelayError> {
        let form_data = serde_json::to_string(&first_values(&form.fields))
            .map_err(|e| RelayError::Internal(format!("Failed to serialize fields: {}", e)))?;

        let mut parts = Vec::with_capacity(1 + 2 * form.files.file_count());
        parts.push(EnvelopePart::Text {
            name: FORM_DATA_FIELD,
            value: form_data,
        });

        for file in form.files.entries() {
            let metadata = FileMetadata::for_file(file);
            let metadata_json = serde_json::to_string(&metadata).map_err(|e| {
                RelayError::Internal(format!("Failed to serialize file metadata: {}", e))
            })?;

            parts.push(EnvelopePart::Text {
                name: FILE_METADATA_FIELD,
                value: metadata_json,
            });
            parts.push(EnvelopePart::Binary {
                name: BINARY_FILE_FIELD,
                file_name: metadata.original_name,
                mime_type: metadata.mime_type,
                data: file.data.clone(),
            });
        }

        Ok(Self { parts })
    }

    /// All parts in wire order.
    pub fn parts(&self) -> &[EnvelopePart] {
        &self.parts
    }

    /// Consume the envelope, yielding its parts in wire order.
    pub fn into_parts(self) -> Vec<EnvelopePart> {
        self.parts
    }

    /// The serialized field map.
    pub fn form_data(&self) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            EnvelopePart::Text { name, value } if *name == FORM_DATA_FIELD => Some(value.as_str()),
            _ => None,
        })
    }

    /// Serialized metadata parts, in file order.
    pub fn metadata_parts(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                EnvelopePart::Text { name, value } if *name == FILE_METADATA_FIELD => {
                    Some(value.as_str())
                }
                _ => None,
            })
            .collect()
    }

    /// Binary parts, in file order.
    pub fn binary_parts(&self) -> Vec<&EnvelopePart> {
        self.parts
            .iter()
            .filter(|part| matches!(part, EnvelopePart::Binary { .. }))
            .collect()
    }

    /// Number of files carried.
    pub fn file_count(&self) -> usize {
        self.binary_parts().len()
    }
}

// Repeated keys keep only their first value.
// TODO: revisit once downstream workflows can accept arrays for repeated keys.
fn first_values(fields: &FieldMap) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|(key, values)| {
            values
                .first()
                .map(|value| (key.to_string(), Value::String(value.clone())))
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
