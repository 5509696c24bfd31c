//! Data models for the client
//!
//! Shapes mirror the backend's wire contract. An upload job is never
//! constructed client-side; these types only ever reflect server state.

mod history;
mod schedule;
mod session;
mod upload;
mod user;

// Re-export all models for convenient imports
pub use history::*;
pub use schedule::*;
pub use session::*;
pub use upload::*;
pub use user::*;
