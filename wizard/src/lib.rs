//! Session-backed multi-step forms.
//!
//! A form is an ordered list of steps that share one session. Visitors move
//! forward one step per validated submission, may step back at any time, and
//! may jump to any step they have already reached. The architecture keeps a
//! strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (step sequencing, merging,
//!   descriptors, actions). No I/O, fully testable in isolation.
//! - **[`io`]**: Session stores, configuration and rendering. Isolated so tests
//!   can swap in in-memory or failing stores.
//!
//! Orchestration modules ([`form`], [`step`]) combine core logic with a
//! [`io::session::SessionStore`] passed explicitly into every operation.

pub mod core;
pub mod definition;
pub mod error;
pub mod exit_codes;
pub mod form;
pub mod io;
pub mod logging;
pub mod step;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::core::fields::{Field, FieldData, FieldKind};
pub use crate::error::{FormError, ValidationError};
pub use crate::form::{CompletionHandler, FormStep, MultiStepForm};
pub use crate::step::StepOutcome;
