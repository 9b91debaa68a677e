//! Shared types for the clinic server
//!
//! Domain models, error codes and response structures used by the server
//! and by any client of its admin API.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};
