//! Shared application state for the form server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use wizard::MultiStepForm;
use wizard::form::Submission;
use wizard::io::session::MemorySession;

use crate::pages::PageRenderer;

/// Cookie carrying the visitor's session id.
pub const SESSION_COOKIE: &str = "wizard_session";

/// One browser's server-side state.
#[derive(Debug, Default)]
pub struct Visitor {
    pub session: MemorySession,
    /// Validation message shown once on the next page view.
    pub flash: Option<String>,
}

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub form: Arc<MultiStepForm>,
    /// Visitors keyed by session cookie value.
    pub visitors: Arc<Mutex<HashMap<String, Visitor>>>,
    /// Submissions handed over by the completion handler, oldest first.
    pub submissions: Arc<Mutex<Vec<Submission>>>,
    pub pages: Arc<PageRenderer>,
}

impl AppState {
    pub fn new(
        form: MultiStepForm,
        submissions: Arc<Mutex<Vec<Submission>>>,
        pages: PageRenderer,
    ) -> Self {
        Self {
            form: Arc::new(form),
            visitors: Arc::new(Mutex::new(HashMap::new())),
            submissions,
            pages: Arc::new(pages),
        }
    }

    /// Lock the visitor map. A poisoned lock only means another request
    /// panicked mid-operation; the map itself stays usable.
    pub fn lock_visitors(&self) -> MutexGuard<'_, HashMap<String, Visitor>> {
        self.visitors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn lock_submissions(&self) -> MutexGuard<'_, Vec<Submission>> {
        self.submissions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Session id from a `Cookie` header value.
pub fn session_id_from_cookie(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
    })
}

/// Fresh random session id (128 bits, hex).
pub fn new_session_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}
