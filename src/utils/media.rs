use mime::Mime;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::fmt;

/// Audio files accepted for migration
pub const AUDIO_TYPES: &[(&str, &str)] = &[("mp3", "audio/mpeg")];

/// Image files accepted for migration
pub const IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
];

/// Characters left as-is in a single path segment: `A-Z a-z 0-9 - _ . ! ~ * ' ( )`
const KEY_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Image,
}

impl MediaKind {
    fn table(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            MediaKind::Audio => AUDIO_TYPES,
            MediaKind::Image => IMAGE_TYPES,
        }
    }

    /// Returns true when the filename ends in one of this kind's extensions.
    /// The comparison ignores case.
    pub fn matches(&self, filename: &str) -> bool {
        extension(filename)
            .map(|ext| self.table().iter().any(|(allowed, _)| *allowed == ext))
            .unwrap_or(false)
    }

    /// Content type for the upload, looked up by extension.
    /// Unmapped extensions fall back to `application/octet-stream`.
    pub fn content_type(&self, filename: &str) -> Mime {
        extension(filename)
            .and_then(|ext| {
                self.table()
                    .iter()
                    .find(|(allowed, _)| *allowed == ext)
                    .and_then(|(_, essence)| essence.parse().ok())
            })
            .unwrap_or(mime::APPLICATION_OCTET_STREAM)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Image => "images",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lowercased text after the last dot, if the name has one.
fn extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Percent-encodes an object key for use as one URL path segment.
pub fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, KEY_SEGMENT).to_string()
}
