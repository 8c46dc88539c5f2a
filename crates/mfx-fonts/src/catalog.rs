//! Built-in font catalog and shared font types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Font used for text overlays when no key is given.
pub const DEFAULT_FONT_KEY: &str = "noto-sans-kr";

/// A font shipped in the system fonts directory.
#[derive(Debug, Clone, Copy)]
pub struct SystemFont {
    pub key: &'static str,
    pub name: &'static str,
    pub filename: &'static str,
    pub description: &'static str,
    pub category: FontCategory,
}

/// Grouping shown in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontCategory {
    Korean,
    Global,
    Fallback,
    User,
}

pub const SYSTEM_FONTS: &[SystemFont] = &[
    SystemFont {
        key: "noto-sans-kr",
        name: "Noto Sans KR",
        filename: "NotoSansKR-Regular.ttf",
        description: "Google Noto Sans KR",
        category: FontCategory::Korean,
    },
    SystemFont {
        key: "nanum-gothic",
        name: "Nanum Gothic",
        filename: "NanumGothic-Regular.ttf",
        description: "Naver Nanum Gothic",
        category: FontCategory::Korean,
    },
    SystemFont {
        key: "pretendard",
        name: "Pretendard",
        filename: "Pretendard-Regular.otf",
        description: "Pretendard",
        category: FontCategory::Korean,
    },
    SystemFont {
        key: "roboto",
        name: "Roboto",
        filename: "Roboto-Regular.ttf",
        description: "Google Roboto",
        category: FontCategory::Global,
    },
    SystemFont {
        key: "inter",
        name: "Inter",
        filename: "Inter-Regular.ttf",
        description: "Inter UI Font",
        category: FontCategory::Global,
    },
    SystemFont {
        key: "dejavu-sans",
        name: "DejaVu Sans",
        filename: "DejaVuSans.ttf",
        description: "Default fallback font",
        category: FontCategory::Fallback,
    },
];

pub fn system_font(key: &str) -> Option<&'static SystemFont> {
    SYSTEM_FONTS.iter().find(|f| f.key == key)
}

/// Which tier a font lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontOrigin {
    System,
    User,
}

/// Listing filter: by tier, or by catalog category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFilter {
    #[default]
    All,
    System,
    User,
    Korean,
    Global,
}

impl FontFilter {
    /// Whether entries from `origin` can pass at all.
    pub fn reaches(self, origin: FontOrigin) -> bool {
        match self {
            Self::All => true,
            Self::User => origin == FontOrigin::User,
            Self::System | Self::Korean | Self::Global => origin == FontOrigin::System,
        }
    }

    pub fn admits(self, entry: &FontEntry) -> bool {
        match self {
            Self::Korean => entry.category == FontCategory::Korean,
            Self::Global => entry.category == FontCategory::Global,
            other => other.reaches(entry.origin),
        }
    }
}

impl std::str::FromStr for FontFilter {
    type Err = mfx_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "korean" => Ok(Self::Korean),
            "global" => Ok(Self::Global),
            other => Err(mfx_core::Error::validation(format!(
                "unknown font filter '{other}' (expected all, system, user, korean or global)"
            ))),
        }
    }
}

/// A font available on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontEntry {
    pub key: String,
    pub name: String,
    pub path: PathBuf,
    pub origin: FontOrigin,
    pub category: FontCategory,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_keys_are_unique() {
        let mut keys: Vec<&str> = SYSTEM_FONTS.iter().map(|f| f.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), SYSTEM_FONTS.len());
    }

    #[test]
    fn default_font_is_in_catalog() {
        let font = system_font(DEFAULT_FONT_KEY).unwrap();
        assert_eq!(font.filename, "NotoSansKR-Regular.ttf");
        assert_eq!(font.category, FontCategory::Korean);
    }

    #[test]
    fn filter_parsing() {
        assert_eq!("user".parse::<FontFilter>().unwrap(), FontFilter::User);
        assert!("everything".parse::<FontFilter>().is_err());
        assert_eq!("korean".parse::<FontFilter>().unwrap(), FontFilter::Korean);
        assert!(FontFilter::All.reaches(FontOrigin::User));
        assert!(!FontFilter::System.reaches(FontOrigin::User));
        assert!(!FontFilter::Global.reaches(FontOrigin::User));
    }
}
