//! Batch files in, result records out.
//!
//! A batch file is a JSON array of work items. Each item is an operation
//! object plus an optional `binary` map naming the local files its binary
//! sources refer to:
//!
//! ```json
//! [{"operation": "trim", "source": {"sourceType": "binary", "binaryProperty": "data"},
//!   "from": 1, "to": 4, "binary": {"data": {"path": "in.mp4"}}}]
//! ```

use anyhow::{Context, Result};
use mfx_core::{BinaryPayload, PayloadContent, Payloads};
use mfx_ops::{ItemOutput, ItemResult, Operation, WorkItem};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

/// A local file attached to an item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinarySpec {
    pub path: PathBuf,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl BinarySpec {
    fn into_payload(self, base: &Path) -> BinaryPayload {
        let path = if self.path.is_absolute() {
            self.path
        } else {
            base.join(self.path)
        };
        let mut payload = BinaryPayload::from_file(path);
        if let Some(name) = self.file_name {
            payload.file_name = Some(name);
        }
        if let Some(mime) = self.mime_type {
            payload = payload.with_mime_type(mime);
        }
        payload
    }
}

/// Parse one item; relative binary paths resolve against `base`.
pub fn parse_item(mut raw: Value, base: &Path) -> Result<WorkItem> {
    let binary = match raw.as_object_mut().and_then(|o| o.remove("binary")) {
        Some(value) => serde_json::from_value::<std::collections::BTreeMap<String, BinarySpec>>(value)
            .context("Invalid 'binary' map")?,
        None => Default::default(),
    };
    let operation: Operation = serde_json::from_value(raw).context("Invalid operation")?;
    let payloads: Payloads = binary
        .into_iter()
        .map(|(name, spec)| (name, spec.into_payload(base)))
        .collect();
    Ok(WorkItem {
        operation,
        payloads,
    })
}

/// Read a batch file.
pub fn read_batch(path: &Path) -> Result<Vec<WorkItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file: {:?}", path))?;
    let items: Vec<Value> = serde_json::from_str(&content)
        .with_context(|| format!("Batch file is not a JSON array: {:?}", path))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    items
        .into_iter()
        .enumerate()
        .map(|(i, raw)| parse_item(raw, base).with_context(|| format!("Batch item {i}")))
        .collect()
}

/// Move a file, falling back to copy and remove across filesystems.
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to).with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;
    if let Err(e) = std::fs::remove_file(from) {
        tracing::warn!("Failed to remove {:?} after copy: {}", from, e);
    }
    Ok(())
}

/// Move an item's binaries into `output_dir` and describe them.
fn place_binaries(index: usize, output: &ItemOutput, output_dir: &Path) -> Result<Value> {
    let mut placed = Map::new();
    for (name, payload) in &output.binaries {
        let PayloadContent::File(path) = &payload.content else {
            continue;
        };
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let target = output_dir.join(format!("{index}-{name}{ext}"));
        move_file(path, &target)?;
        placed.insert(
            name.clone(),
            json!({
                "path": target,
                "fileName": target.file_name().map(|n| n.to_string_lossy().into_owned()),
                "mimeType": payload.mime_type,
            }),
        );
    }
    Ok(Value::Object(placed))
}

/// The record printed for one item, with its binaries moved into place.
pub fn result_record(index: usize, result: &ItemResult, output_dir: &Path) -> Result<Value> {
    match result {
        ItemResult::Success(output) => {
            let binary = place_binaries(index, output, output_dir)?;
            Ok(json!({
                "index": index,
                "json": output.json,
                "binary": binary,
            }))
        }
        ItemResult::Failure(record) => {
            let mut value = serde_json::to_value(record)?;
            value["index"] = json!(index);
            Ok(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn binary_map_becomes_payloads() {
        let item = parse_item(
            json!({
                "operation": "trim",
                "source": {"sourceType": "binary", "binaryProperty": "data"},
                "from": 1, "to": 4,
                "binary": {"data": {"path": "clips/in.mp4", "mimeType": "video/mp4"}}
            }),
            Path::new("/work"),
        )
        .unwrap();
        assert_matches!(item.operation, Operation::Trim(_));
        let payload = &item.payloads["data"];
        assert_eq!(payload.content, PayloadContent::File(PathBuf::from("/work/clips/in.mp4")));
        assert_eq!(payload.file_name.as_deref(), Some("in.mp4"));
        assert_eq!(payload.mime_type.as_deref(), Some("video/mp4"));
    }

    #[test]
    fn unknown_operation_is_rejected() {
        let err = parse_item(json!({"operation": "explode"}), Path::new(".")).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid operation"));
    }

    #[test]
    fn batch_must_be_an_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("batch.json");
        std::fs::write(&path, r#"{"operation": "listFonts"}"#).unwrap();
        assert!(read_batch(&path).is_err());
    }

    #[test]
    fn success_record_moves_outputs() {
        let dir = tempdir().unwrap();
        let produced = dir.path().join("mediafx-1.mp4");
        std::fs::write(&produced, b"video").unwrap();
        let out_dir = dir.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();

        let output = ItemOutput::media("trim", produced.clone());
        let record = result_record(3, &ItemResult::Success(output), &out_dir).unwrap();

        assert_eq!(record["index"], 3);
        assert_eq!(record["binary"]["data"]["fileName"], "3-data.mp4");
        assert!(!produced.exists());
        assert!(out_dir.join("3-data.mp4").exists());
    }

    #[test]
    fn failure_record_shape() {
        let err = mfx_core::Error::validation("bad window");
        let result = ItemResult::Failure(mfx_ops::ErrorRecord::new("trim", &err));
        let record = result_record(0, &result, Path::new(".")).unwrap();
        assert_eq!(record["kind"], "ValidationError");
        assert_eq!(record["operation"], "trim");
        assert!(record["error"].as_str().unwrap().contains("bad window"));
    }
}
