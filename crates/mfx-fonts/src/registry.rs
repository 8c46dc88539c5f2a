//! Font lookup across the system catalog and the user-font index.
//!
//! System fonts are the static [`SYSTEM_FONTS`] table, filtered to files that
//! exist in the fonts directory. User fonts live in `<dir>/user` next to a
//! JSON index mapping key to `{name, filename, description, createdAt}`.
//! Keys are unique across both tiers.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use mfx_core::{Error, Result};
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::{FontCategory, FontEntry, FontFilter, FontOrigin, SYSTEM_FONTS};

const KEY_FORMAT_MESSAGE: &str =
    "Font key must be 3-50 characters, containing only letters, numbers, hyphens, and underscores.";
const DUPLICATE_KEY_MESSAGE: &str = "Font key already exists. Please use a different key.";

/// One record of the user-font index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserFontRecord {
    name: String,
    filename: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    created_at: String,
}

type UserIndex = BTreeMap<String, UserFontRecord>;

/// Outcome of [`FontRegistry::validate_key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A font file to add to the user tier.
#[derive(Debug, Clone, Default)]
pub struct FontUpload<'a> {
    pub key: &'a str,
    /// Display name; defaults to the key.
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    /// Original file name, used for the stored extension.
    pub file_name: Option<&'a str>,
    pub data: &'a [u8],
}

fn key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{3,50}$").expect("valid font key regex"))
}

/// Resolves font keys to files and manages user uploads.
#[derive(Debug)]
pub struct FontRegistry {
    system_dir: PathBuf,
    user_dir: PathBuf,
    index_path: PathBuf,
    index_lock: Mutex<()>,
}

impl FontRegistry {
    pub fn new(config: &mfx_core::config::FontsConfig) -> Self {
        Self {
            system_dir: config.dir.clone(),
            user_dir: config.user_dir(),
            index_path: config.user_index(),
            index_lock: Mutex::new(()),
        }
    }

    pub fn system_dir(&self) -> &Path {
        &self.system_dir
    }

    /// Every available font, system tier first, each tier ordered by key.
    pub fn list(&self, filter: FontFilter) -> Vec<FontEntry> {
        let mut fonts = Vec::new();
        if filter.reaches(FontOrigin::System) {
            fonts.extend(self.system_entries());
        }
        if filter.reaches(FontOrigin::User) {
            let _guard = self.index_lock.lock();
            fonts.extend(self.user_entries(&self.read_index()));
        }
        fonts.retain(|f| filter.admits(f));
        fonts
    }

    /// Look up one available font.
    pub fn info(&self, key: &str) -> Result<FontEntry> {
        self.list(FontFilter::All)
            .into_iter()
            .find(|f| f.key == key)
            .ok_or_else(|| Error::not_found("font", key))
    }

    /// Path of the font file for `key`.
    pub fn resolve(&self, key: &str) -> Result<PathBuf> {
        let entry = self.info(key)?;
        tracing::debug!("font '{key}' -> {}", entry.path.display());
        Ok(entry.path)
    }

    /// Check a key without failing.
    pub fn validate_key(&self, key: &str) -> KeyValidation {
        match self.check_key(key) {
            Ok(()) => KeyValidation {
                valid: true,
                message: None,
            },
            Err(Error::Validation(message)) => KeyValidation {
                valid: false,
                message: Some(message),
            },
            Err(other) => KeyValidation {
                valid: false,
                message: Some(other.to_string()),
            },
        }
    }

    fn check_key(&self, key: &str) -> Result<()> {
        if !key_regex().is_match(key) {
            return Err(Error::validation(KEY_FORMAT_MESSAGE));
        }
        if self.is_taken(key) {
            return Err(Error::validation(DUPLICATE_KEY_MESSAGE));
        }
        Ok(())
    }

    /// A key is taken when it is in the catalog or the user index, whether
    /// or not its file is present.
    fn is_taken(&self, key: &str) -> bool {
        SYSTEM_FONTS.iter().any(|f| f.key == key) || self.read_index().contains_key(key)
    }

    /// Store a user font and record it in the index.
    pub fn upload(&self, upload: FontUpload<'_>) -> Result<FontEntry> {
        let _guard = self.index_lock.lock();
        self.check_key(upload.key)?;

        let ext = upload
            .file_name
            .and_then(|n| Path::new(n).extension())
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let filename = format!("{}{ext}", upload.key);

        fs::create_dir_all(&self.user_dir)?;
        let path = self.user_dir.join(&filename);
        fs::write(&path, upload.data)?;

        let record = UserFontRecord {
            name: upload
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or(upload.key)
                .to_string(),
            filename,
            description: upload.description.unwrap_or_default().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        let mut index = self.read_index();
        index.insert(upload.key.to_string(), record.clone());
        if let Err(e) = self.write_index(&index) {
            let _ = fs::remove_file(&path);
            return Err(e);
        }

        tracing::info!("uploaded user font '{}' ({})", upload.key, path.display());
        Ok(user_entry(upload.key, &record, path))
    }

    /// Remove a user font: file first, then the index entry.
    pub fn delete(&self, key: &str) -> Result<FontEntry> {
        let _guard = self.index_lock.lock();
        let mut index = self.read_index();
        let record = index
            .remove(key)
            .ok_or_else(|| Error::not_found("user font", key))?;

        let path = self.user_dir.join(&record.filename);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("user font file {} was already missing", path.display());
            }
            Err(e) => return Err(e.into()),
        }
        self.write_index(&index)?;

        tracing::info!("deleted user font '{key}'");
        Ok(user_entry(key, &record, path))
    }

    fn system_entries(&self) -> Vec<FontEntry> {
        let mut fonts: Vec<FontEntry> = SYSTEM_FONTS
            .iter()
            .filter_map(|f| {
                let path = self.system_dir.join(f.filename);
                path.is_file().then(|| FontEntry {
                    key: f.key.to_string(),
                    name: f.name.to_string(),
                    path,
                    origin: FontOrigin::System,
                    category: f.category,
                    description: f.description.to_string(),
                    created_at: None,
                })
            })
            .collect();
        fonts.sort_by(|a, b| a.key.cmp(&b.key));
        fonts
    }

    fn user_entries(&self, index: &UserIndex) -> Vec<FontEntry> {
        index
            .iter()
            .filter_map(|(key, record)| {
                let path = self.user_dir.join(&record.filename);
                path.is_file().then(|| user_entry(key, record, path))
            })
            .collect()
    }

    /// A missing or unreadable index is an empty one.
    fn read_index(&self) -> UserIndex {
        let data = match fs::read_to_string(&self.index_path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return UserIndex::new(),
            Err(e) => {
                tracing::warn!("cannot read {}: {e}", self.index_path.display());
                return UserIndex::new();
            }
        };
        serde_json::from_str(&data).unwrap_or_else(|e| {
            tracing::warn!("ignoring corrupt font index {}: {e}", self.index_path.display());
            UserIndex::new()
        })
    }

    fn write_index(&self, index: &UserIndex) -> Result<()> {
        fs::create_dir_all(&self.user_dir)?;
        let json = serde_json::to_string_pretty(index)?;
        fs::write(&self.index_path, json)?;
        Ok(())
    }
}

fn user_entry(key: &str, record: &UserFontRecord, path: PathBuf) -> FontEntry {
    FontEntry {
        key: key.to_string(),
        name: record.name.clone(),
        path,
        origin: FontOrigin::User,
        category: FontCategory::User,
        description: record.description.clone(),
        created_at: Some(record.created_at.clone()).filter(|c| !c.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use mfx_core::config::FontsConfig;

    fn registry(dir: &Path) -> FontRegistry {
        FontRegistry::new(&FontsConfig {
            dir: dir.to_path_buf(),
        })
    }

    fn upload<'a>(key: &'a str, data: &'a [u8]) -> FontUpload<'a> {
        FontUpload {
            key,
            file_name: Some("Custom-Bold.ttf"),
            data,
            ..Default::default()
        }
    }

    #[test]
    fn system_fonts_require_files() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());
        assert!(reg.list(FontFilter::All).is_empty());

        fs::write(dir.path().join("Roboto-Regular.ttf"), b"ttf").unwrap();
        let fonts = reg.list(FontFilter::System);
        assert_eq!(fonts.len(), 1);
        assert_eq!(fonts[0].key, "roboto");
        assert_eq!(fonts[0].origin, FontOrigin::System);
        assert_eq!(reg.resolve("roboto").unwrap(), dir.path().join("Roboto-Regular.ttf"));
        assert_matches!(reg.resolve("inter"), Err(Error::NotFound { .. }));
    }

    #[test]
    fn category_filters() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());
        for file in ["NotoSansKR-Regular.ttf", "Inter-Regular.ttf", "DejaVuSans.ttf"] {
            fs::write(dir.path().join(file), b"ttf").unwrap();
        }
        reg.upload(upload("brand_font", b"font-bytes")).unwrap();

        let keys = |filter| -> Vec<String> {
            reg.list(filter).into_iter().map(|f| f.key).collect()
        };
        assert_eq!(keys(FontFilter::Korean), ["noto-sans-kr"]);
        assert_eq!(keys(FontFilter::Global), ["inter"]);
        assert_eq!(keys(FontFilter::System).len(), 3);
        assert_eq!(keys(FontFilter::All).len(), 4);
    }

    #[test]
    fn upload_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());

        let entry = reg.upload(upload("brand_font", b"font-bytes")).unwrap();
        assert_eq!(entry.name, "brand_font");
        assert_eq!(entry.path, dir.path().join("user").join("brand_font.ttf"));
        assert_eq!(fs::read(&entry.path).unwrap(), b"font-bytes");
        assert!(entry.created_at.is_some());

        let users = reg.list(FontFilter::User);
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].category, FontCategory::User);
        assert_eq!(reg.resolve("brand_font").unwrap(), entry.path);

        let index: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("user/user-fonts.json")).unwrap())
                .unwrap();
        assert_eq!(index["brand_font"]["filename"], "brand_font.ttf");
        assert!(index["brand_font"]["createdAt"].is_string());

        reg.delete("brand_font").unwrap();
        assert!(!entry.path.exists());
        assert!(reg.list(FontFilter::User).is_empty());
        assert_matches!(reg.delete("brand_font"), Err(Error::NotFound { .. }));
    }

    #[test]
    fn key_format_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());
        let too_long = "x".repeat(51);
        for bad in ["ab", "has space", "dot.name", too_long.as_str()] {
            let err = reg.upload(upload(bad, b"x")).unwrap_err();
            assert_eq!(err.to_string(), format!("Validation error: {KEY_FORMAT_MESSAGE}"));
        }
        assert!(reg.validate_key("abc").valid);
        assert!(reg.validate_key(&"x".repeat(50)).valid);
        let v = reg.validate_key("a!");
        assert!(!v.valid);
        assert_eq!(v.message.as_deref(), Some(KEY_FORMAT_MESSAGE));
    }

    #[test]
    fn keys_are_unique_across_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());

        // Catalog keys are reserved even when the file is absent.
        let v = reg.validate_key("roboto");
        assert_eq!(v.message.as_deref(), Some(DUPLICATE_KEY_MESSAGE));

        reg.upload(upload("mine", b"x")).unwrap();
        assert_matches!(reg.upload(upload("mine", b"y")), Err(Error::Validation(_)));
        assert_eq!(fs::read(dir.path().join("user/mine.ttf")).unwrap(), b"x");
    }

    #[test]
    fn system_fonts_cannot_be_deleted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("DejaVuSans.ttf"), b"ttf").unwrap();
        let reg = registry(dir.path());
        assert_matches!(reg.delete("dejavu-sans"), Err(Error::NotFound { .. }));
        assert!(dir.path().join("DejaVuSans.ttf").exists());
    }

    #[test]
    fn upload_without_extension_and_with_name() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());
        let entry = reg
            .upload(FontUpload {
                key: "plain",
                name: Some("Plain Sans"),
                description: Some("house style"),
                file_name: None,
                data: b"x",
            })
            .unwrap();
        assert_eq!(entry.path.file_name().unwrap(), "plain");
        assert_eq!(entry.name, "Plain Sans");
        assert_eq!(reg.info("plain").unwrap().description, "house style");
    }

    #[test]
    fn corrupt_index_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("user")).unwrap();
        fs::write(dir.path().join("user/user-fonts.json"), "{not json").unwrap();
        let reg = registry(dir.path());
        assert!(reg.list(FontFilter::User).is_empty());
        reg.upload(upload("fresh", b"x")).unwrap();
        assert_eq!(reg.list(FontFilter::User).len(), 1);
    }
}
