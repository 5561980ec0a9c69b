// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Single-file attachment editor.
//!
//! The stored value is a JSON list holding one `{title, mimetype, size, data}`
//! object where `data` is a base64 data URI. Selecting a file replaces any
//! previous value; removing clears the field.

use base64::prelude::*;
use serde::{Deserialize, Serialize};

const FALLBACK_MIME: &str = "application/octet-stream";

/// One attached file as stored in the cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentFile {
    /// Original file name.
    #[serde(default)]
    pub title: String,
    /// MIME type.
    #[serde(default)]
    pub mimetype: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// `data:` URI with the file contents. Absent for files the backend
    /// stored itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl AttachmentFile {
    /// Size for display, e.g. `12.5 KB`.
    #[allow(clippy::cast_precision_loss)]
    pub fn size_label(&self) -> String {
        format!("{:.1} KB", self.size as f64 / 1024.0)
    }
}

/// `data:{mime};base64,{payload}`.
pub fn data_uri(mimetype: &str, bytes: &[u8]) -> String {
    let mime = if mimetype.is_empty() { FALLBACK_MIME } else { mimetype };
    format!("data:{mime};base64,{}", BASE64_STANDARD.encode(bytes))
}

/// Editor state for an attachment field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentEditor {
    current: Option<AttachmentFile>,
}

impl AttachmentEditor {
    /// Seed from the field's string value. Anything that is not a non-empty
    /// JSON list of files reads as no attachment.
    pub fn from_value(value: &str) -> Self {
        let current = serde_json::from_str::<Vec<AttachmentFile>>(value)
            .ok()
            .and_then(|files| files.into_iter().next());
        Self { current }
    }

    /// The attached file, if any.
    pub fn current(&self) -> Option<&AttachmentFile> {
        self.current.as_ref()
    }

    /// Attach a file. Returns the new field value.
    pub fn select_file(&mut self, name: &str, mimetype: &str, bytes: &[u8]) -> String {
        let file = AttachmentFile {
            title: name.to_string(),
            mimetype: mimetype.to_string(),
            size: bytes.len() as u64,
            data: Some(data_uri(mimetype, bytes)),
        };
        let value = serde_json::json!([file]).to_string();
        self.current = Some(file);
        value
    }

    /// Drop the attachment. Returns the new (empty) field value.
    pub fn remove(&mut self) -> String {
        self.current = None;
        String::new()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;

    #[test]
    fn selecting_a_file_embeds_a_data_uri() {
        let mut editor = AttachmentEditor::default();
        let value = editor.select_file("hi.txt", "text/plain", b"hello");
        let parsed: serde_json::Value = serde_json::from_str(&value).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([{
                "title": "hi.txt",
                "mimetype": "text/plain",
                "size": 5,
                "data": "data:text/plain;base64,aGVsbG8="
            }])
        );
        assert_eq!(AttachmentEditor::from_value(&value), editor);
    }

    #[test]
    fn a_new_file_replaces_the_old_one() {
        let mut editor = AttachmentEditor::from_value(
            r#"[{"title":"old.png","mimetype":"image/png","size":2048}]"#,
        );
        assert_eq!(editor.current().map(AttachmentFile::size_label).as_deref(), Some("2.0 KB"));
        let value = editor.select_file("new.bin", "", &[0, 1]);
        let files: Vec<AttachmentFile> = serde_json::from_str(&value).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].title, "new.bin");
        assert_eq!(files[0].data.as_deref(), Some("data:application/octet-stream;base64,AAE="));
    }

    #[test]
    fn remove_clears_and_garbage_reads_as_empty() {
        let mut editor = AttachmentEditor::from_value("[]");
        assert!(editor.current().is_none());
        editor.select_file("a", "text/plain", b"a");
        assert_eq!(editor.remove(), "");
        assert!(editor.current().is_none());
        assert!(AttachmentEditor::from_value("{not json").current().is_none());
    }
}
