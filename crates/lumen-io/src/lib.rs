//! Lumen I/O - preset persistence and automation-config export
//!
//! External collaborators of the lighting core:
//!
//! - [`presets`] - JSON preset store (load/save the whole bank)
//! - [`companion`] - Bitfocus Companion config exporter built on the
//!   core's flattened preset view
//! - [`error`] - Error types

/// Bitfocus Companion export
pub mod companion;
/// Error types
pub mod error;
/// Preset store
pub mod presets;

pub use companion::CompanionExporter;
pub use error::{IoError, Result};
pub use presets::{load_presets, save_presets};
