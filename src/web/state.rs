use std::sync::Arc;

use crate::core::TraceCore;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct WebAppState {
    core: Arc<TraceCore>,
}

impl WebAppState {
    pub fn new(core: TraceCore) -> Self {
        Self {
            core: Arc::new(core),
        }
    }

    pub fn core(&self) -> &TraceCore {
        &self.core
    }
}
