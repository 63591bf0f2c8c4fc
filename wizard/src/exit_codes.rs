//! Stable exit codes for wizard CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid layout, config, definition or session, or any other error.
pub const INVALID: i32 = 1;
/// `wizard next` submitted the last step and the form completed.
pub const COMPLETE: i32 = 2;
/// `wizard next` was rejected by validation; the data is kept as pending.
pub const REJECTED: i32 = 3;
