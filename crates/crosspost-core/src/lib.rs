//! Crosspost Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration, and
//! upload policy shared by the Crosspost client and CLI. The backend API is
//! an external collaborator; nothing here talks to the network.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ClientError, ErrorKind};
pub use models::{
    AuthStatus, JobStatus, MeResponse, Platform, ProjectHistory, ScheduleOutcome, ScheduleRequest,
    Session, StatusResponse, TokenResponse, UploadRecord, UploadResponse, User,
};
pub use validation::{
    content_type_for_path, format_size, validate_file, FileRejection, MediaKind,
};
