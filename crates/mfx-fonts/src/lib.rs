//! # mfx-fonts
//!
//! Maps symbolic font keys to font files. System fonts come from a static
//! catalog checked against the fonts directory; user fonts are uploaded into
//! a subdirectory and recorded in a JSON index.

pub mod catalog;
pub mod registry;

pub use catalog::{
    system_font, FontCategory, FontEntry, FontFilter, FontOrigin, SystemFont, DEFAULT_FONT_KEY,
    SYSTEM_FONTS,
};
pub use registry::{FontRegistry, FontUpload, KeyValidation};
