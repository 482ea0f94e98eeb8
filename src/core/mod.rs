//! Core types shared across the crate
//!
//! - `PermissionError` - Error types

pub mod error;

pub use error::{PermissionError, PermissionResult};
