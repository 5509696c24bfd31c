//! Validation modules

pub mod file;

pub use file::{content_type_for_path, format_size, validate_file, FileRejection, MediaKind};
