//! Explicit session context
//!
//! The batch orchestrator takes its authentication state and template from
//! a `Session` value passed in by the caller, never from globals. A
//! session is initialized per run and cleared on logout or a new upload.

use crate::{Result, Template};

/// Per-run session state: whether the caller is authenticated and which
/// template (if any) has been loaded.
#[derive(Debug, Default)]
pub struct Session {
    authenticated: bool,
    template: Option<Template>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the session authenticated (configuration validated upstream)
    pub fn authenticate(&mut self) {
        self.authenticated = true;
    }

    /// Clear authentication and any loaded template
    pub fn logout(&mut self) {
        self.authenticated = false;
        self.template = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Load (or replace) the session template from raw bytes
    pub fn load_template(&mut self, bytes: Vec<u8>) -> Result<()> {
        self.template = Some(Template::from_bytes(bytes)?);
        Ok(())
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }
}
