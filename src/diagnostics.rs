//! Append-only diagnostics sink shared by every pipeline stage.
//!
//! The reporter keeps two flags: `build_error` (scanner, parser, resolver)
//! and `runtime_error` (interpreter). Warnings are recorded but raise
//! neither flag. Printing is left to the driver, which drains the collected
//! diagnostics after each run.

use log::{debug, info};

use crate::error::LoxError;

#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: Vec<LoxError>,
    build_error: bool,
    runtime_error: bool,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and raise the matching flag.
    pub fn report(&mut self, error: LoxError) {
        if error.is_build_error() {
            self.build_error = true;
        } else if error.is_runtime_error() {
            self.runtime_error = true;
        }

        debug!("Reported diagnostic: {}", error);

        self.diagnostics.push(error);
    }

    pub fn had_build_error(&self) -> bool {
        self.build_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.runtime_error
    }

    /// Reset the build flag between interactive lines.
    pub fn clear_build_error(&mut self) {
        info!("Clearing build error flag");

        self.build_error = false;
    }

    /// Diagnostics recorded so far, oldest first.
    pub fn diagnostics(&self) -> &[LoxError] {
        &self.diagnostics
    }

    /// Hand the recorded diagnostics to the caller, keeping the flags.
    pub fn take_diagnostics(&mut self) -> Vec<LoxError> {
        std::mem::take(&mut self.diagnostics)
    }
}
