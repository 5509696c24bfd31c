//! Client-side file validation
//!
//! Stateless checks run before any network call. A file is accepted for a
//! slot iff its content type is exactly in that slot's allow-list and its
//! size is within the slot's ceiling. A rejected file is never attached to a
//! submission, so validation failures never reach the network layer.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ALLOWED_AUDIO_TYPES, ALLOWED_IMAGE_TYPES, ALLOWED_VIDEO_TYPES, MAX_AUDIO_SIZE_BYTES,
    MAX_IMAGE_SIZE_BYTES, MAX_VIDEO_SIZE_BYTES,
};

/// The three upload slots. Video and audio are required for a submission,
/// thumbnail is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Thumbnail,
}

impl MediaKind {
    pub fn allowed_types(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Video => ALLOWED_VIDEO_TYPES,
            MediaKind::Audio => ALLOWED_AUDIO_TYPES,
            MediaKind::Thumbnail => ALLOWED_IMAGE_TYPES,
        }
    }

    pub fn max_size_bytes(&self) -> u64 {
        match self {
            MediaKind::Video => MAX_VIDEO_SIZE_BYTES,
            MediaKind::Audio => MAX_AUDIO_SIZE_BYTES,
            MediaKind::Thumbnail => MAX_IMAGE_SIZE_BYTES,
        }
    }

    /// Multipart field name expected by the backend.
    pub fn field_name(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Thumbnail => "thumbnail",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.field_name())
    }
}

/// Reason a file was rejected client-side.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileRejection {
    #[error("Invalid file type: {content_type}. Allowed {kind} types: {allowed}")]
    UnsupportedType {
        kind: MediaKind,
        content_type: String,
        allowed: String,
    },

    #[error("File exceeds {} limit. Current size: {}", format_size(*.limit), format_size(*.size))]
    TooLarge { kind: MediaKind, size: u64, limit: u64 },
}

/// Validate a candidate file against the policy for its slot.
pub fn validate_file(
    content_type: &str,
    size: u64,
    kind: MediaKind,
) -> Result<(), FileRejection> {
    if !kind.allowed_types().contains(&content_type) {
        return Err(FileRejection::UnsupportedType {
            kind,
            content_type: content_type.to_string(),
            allowed: kind.allowed_types().join(", "),
        });
    }
    if size > kind.max_size_bytes() {
        return Err(FileRejection::TooLarge {
            kind,
            size,
            limit: kind.max_size_bytes(),
        });
    }
    Ok(())
}

/// Infer a content type from a file extension. The CLI has no browser File
/// object carrying a declared MIME type, so the extension is all we have.
/// Unknown extensions yield `None` and fail validation downstream.
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match ext.as_str() {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "avi" => "video/avi",
        "mov" => "video/mov",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "aac" => "audio/aac",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => return None,
    };
    Some(content_type)
}

/// Human-readable file size, one decimal place.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_type_within_limit() {
        assert!(validate_file("video/mp4", 1024, MediaKind::Video).is_ok());
        assert!(validate_file("audio/wav", 1024, MediaKind::Audio).is_ok());
        assert!(validate_file("image/png", 1024, MediaKind::Thumbnail).is_ok());
    }

    #[test]
    fn rejects_wrong_type() {
        let err = validate_file("text/plain", 10, MediaKind::Video).unwrap_err();
        assert!(matches!(err, FileRejection::UnsupportedType { .. }));
        let msg = err.to_string();
        assert!(msg.contains("text/plain"));
        assert!(msg.contains("video/mp4"));
    }

    #[test]
    fn allow_list_is_exact_match() {
        // Prefix match is not enough; the type must be listed verbatim
        assert!(validate_file("video/x-matroska", 10, MediaKind::Video).is_err());
        assert!(validate_file("audio/ogg", 10, MediaKind::Audio).is_err());
    }

    #[test]
    fn category_types_do_not_cross() {
        assert!(validate_file("audio/mpeg", 10, MediaKind::Video).is_err());
        assert!(validate_file("video/mp4", 10, MediaKind::Thumbnail).is_err());
    }

    #[test]
    fn rejects_oversize() {
        let limit = MediaKind::Thumbnail.max_size_bytes();
        assert!(validate_file("image/png", limit, MediaKind::Thumbnail).is_ok());
        let err = validate_file("image/png", limit + 1, MediaKind::Thumbnail).unwrap_err();
        assert!(matches!(err, FileRejection::TooLarge { .. }));
        assert!(err.to_string().contains("10.0 MB"));
    }

    #[test]
    fn per_kind_ceilings_differ() {
        let video_limit = MediaKind::Video.max_size_bytes();
        // A file too large for audio is still fine as video
        assert!(validate_file("audio/wav", video_limit, MediaKind::Audio).is_err());
        assert!(validate_file("video/mp4", video_limit, MediaKind::Video).is_ok());
    }

    #[test]
    fn content_type_inference() {
        assert_eq!(
            content_type_for_path(Path::new("clip.mp4")),
            Some("video/mp4")
        );
        assert_eq!(
            content_type_for_path(Path::new("track.MP3")),
            Some("audio/mpeg")
        );
        assert_eq!(
            content_type_for_path(Path::new("cover.jpeg")),
            Some("image/jpeg")
        );
        assert_eq!(content_type_for_path(Path::new("notes.txt")), None);
        assert_eq!(content_type_for_path(Path::new("noext")), None);
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(100 * 1024 * 1024), "100.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
