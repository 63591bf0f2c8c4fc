//! I/O helpers for form operations.

pub mod config;
pub mod file_session;
pub mod render;
pub mod session;
pub mod store;
