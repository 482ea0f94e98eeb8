pub mod config;
pub mod core;
pub mod logging;
pub mod permissions;
pub mod scenario;

pub use crate::core::{PermissionError, PermissionResult};
