//! Error types for the lighting core
use thiserror::Error;

/// Lighting core errors
#[derive(Error, Debug)]
pub enum LumenError {
    /// Fixture value outside the DMX byte range
    #[error("value {value} for {role} must be contained in [0,255]")]
    Range {
        /// Human-readable role name of the offending fixture-index
        role: String,
        /// The rejected value
        value: u16,
    },

    /// Absolute slot index outside the universe
    #[error("slot {slot} is outside the universe [1,{packet_size}]")]
    Address {
        /// The rejected absolute slot
        slot: usize,
        /// Size of the slot buffer
        packet_size: usize,
    },

    /// Invalid construction-time configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A member with this name is already present in the group
    #[error("light '{0}' is already a member of the group")]
    DuplicateName(String),

    /// The light is already claimed by another group
    #[error("light '{light}' already belongs to group '{group}'")]
    AlreadyGrouped {
        /// Name of the light being added
        light: String,
        /// Name of the group that currently claims it
        group: String,
    },

    /// No fixture registered under this name
    #[error("no light source named '{0}'")]
    UnknownName(String),

    /// State vector length does not match the channel width
    #[error("expected {expected} values, got {actual}")]
    WidthMismatch {
        /// Channel width
        expected: usize,
        /// Length of the provided vector
        actual: usize,
    },

    /// Network send failure
    #[error("transmission error: {0}")]
    Transmission(#[from] std::io::Error),
}

/// Result type for lighting core operations
pub type Result<T> = std::result::Result<T, LumenError>;
