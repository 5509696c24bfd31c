//! Upload policy constants
//!
//! MIME allow-lists and size ceilings are compiled in, not runtime
//! configurable. The backend enforces its own limits server-side; these exist
//! so a bad file is rejected before any bytes leave the machine.

/// Content types accepted for the video slot.
pub const ALLOWED_VIDEO_TYPES: &[&str] = &["video/mp4", "video/webm", "video/avi", "video/mov"];

/// Content types accepted for the audio slot.
pub const ALLOWED_AUDIO_TYPES: &[&str] = &["audio/mpeg", "audio/wav", "audio/aac", "audio/mp3"];

/// Content types accepted for the optional thumbnail slot.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

pub const MAX_VIDEO_SIZE_BYTES: u64 = 100 * 1024 * 1024;
pub const MAX_AUDIO_SIZE_BYTES: u64 = 50 * 1024 * 1024;
pub const MAX_IMAGE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Default interval between job status polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

/// Default HTTP request timeout. Uploads can be large, so this is generous.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Chunk size used when streaming multipart bodies with progress accounting.
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;
