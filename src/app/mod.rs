//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering

mod effects;
mod event_loop;
mod input;
mod model;
mod update;
mod view;

pub use model::{Model, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

/// Main application struct that owns the terminal and runs the event loop.
pub struct App {
    file_path: PathBuf,
    watch_enabled: bool,
    sync_enabled: bool,
    diagrams_enabled: bool,
    split_percent: Option<f64>,
    force_half_cell: bool,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create a new application for the given file.
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            watch_enabled: false,
            sync_enabled: true,
            diagrams_enabled: true,
            split_percent: None,
            force_half_cell: false,
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Enable or disable file watching.
    pub fn with_watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    /// Enable or disable scroll synchronization between the panes.
    pub fn with_sync(mut self, enabled: bool) -> Self {
        self.sync_enabled = enabled;
        self
    }

    /// Enable or disable diagram materialization.
    pub fn with_diagrams(mut self, enabled: bool) -> Self {
        self.diagrams_enabled = enabled;
        self
    }

    /// Set the initial divider position (percent, clamped to [10, 90]).
    pub const fn with_split(mut self, percent: Option<f64>) -> Self {
        self.split_percent = percent;
        self
    }

    /// Force half-cell image rendering, bypassing protocol detection.
    pub const fn with_force_half_cell(mut self, force: bool) -> Self {
        self.force_half_cell = force;
        self
    }

    /// Set config paths to show in help.
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }
}

#[cfg(test)]
mod tests;
