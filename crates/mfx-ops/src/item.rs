//! Work items in, results out.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mfx_core::{BinaryPayload, Payloads};
use serde_json::{json, Map, Value};

use crate::operation::Operation;

/// Payload name of an operation's primary output.
pub const PRIMARY_OUTPUT: &str = "data";

/// One operation plus the binary payloads its sources may reference.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub operation: Operation,
    pub payloads: Payloads,
}

impl WorkItem {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            payloads: Payloads::new(),
        }
    }

    pub fn with_payload(mut self, name: impl Into<String>, payload: BinaryPayload) -> Self {
        self.payloads.insert(name.into(), payload);
        self
    }
}

/// Result of one successful item.
///
/// File-backed binaries are owned by the caller once returned; nothing in
/// this crate removes them afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemOutput {
    pub json: Value,
    pub binaries: BTreeMap<String, BinaryPayload>,
}

impl ItemOutput {
    pub fn json(json: Value) -> Self {
        Self {
            json,
            binaries: BTreeMap::new(),
        }
    }

    /// A media result with `path` as its primary output.
    pub fn media(operation: &str, path: PathBuf) -> Self {
        Self::json(json!({ "operation": operation, "success": true })).with_file(PRIMARY_OUTPUT, path)
    }

    pub fn with_file(mut self, name: &str, path: PathBuf) -> Self {
        let mut payload = BinaryPayload::from_file(path.clone());
        if let Some(mime) = mime_for(&path) {
            payload = payload.with_mime_type(mime);
        }
        self.binaries.insert(name.to_string(), payload);
        self
    }

    /// Merge extra fields into the JSON object.
    pub fn with_fields(mut self, fields: Value) -> Self {
        let Value::Object(extra) = fields else {
            return self;
        };
        if !self.json.is_object() {
            self.json = Value::Object(Map::new());
        }
        if let Value::Object(target) = &mut self.json {
            target.extend(extra);
        }
        self
    }

    /// Paths of file-backed binaries.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.binaries.values().filter_map(|b| match &b.content {
            mfx_core::PayloadContent::File(p) => Some(p.as_path()),
            mfx_core::PayloadContent::Bytes(_) => None,
        })
    }
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "ts" => "video/mp2t",
        "mp3" => "audio/mpeg",
        "aac" => "audio/aac",
        "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_output_carries_mime_type() {
        let out = ItemOutput::media("trim", PathBuf::from("/tmp/mediafx-1.mp4"))
            .with_fields(json!({ "from": 1.0 }));
        assert_eq!(out.json["operation"], "trim");
        assert_eq!(out.json["from"], 1.0);
        let data = &out.binaries[PRIMARY_OUTPUT];
        assert_eq!(data.mime_type.as_deref(), Some("video/mp4"));
        assert_eq!(data.file_name.as_deref(), Some("mediafx-1.mp4"));
        assert_eq!(out.files().count(), 1);
    }

    #[test]
    fn unknown_extension_has_no_mime_type() {
        let out = ItemOutput::media("x", PathBuf::from("/tmp/out.xyz"));
        assert_eq!(out.binaries[PRIMARY_OUTPUT].mime_type, None);
    }
}
