//! Fixture role table
//!
//! Maps the symbolic function of a fixture slot (dimmer, red, strobe, ...)
//! to its 1-based fixture-index within a channel. The table is fixed
//! process-wide configuration; it is never mutated after startup.

use serde::{Deserialize, Serialize};

/// Default number of fixture slots per channel
pub const DEFAULT_CHANNEL_WIDTH: usize = 11;

/// Symbolic function of a fixture-index within a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Dimmer,
    DimmerFine,
    Strobe,
    Red,
    Green,
    Blue,
    White,
    Amber,
    Uv,
    Preset,
    Sound,
}

impl Role {
    /// All roles in fixture-index order
    pub const ALL: [Role; DEFAULT_CHANNEL_WIDTH] = [
        Role::Dimmer,
        Role::DimmerFine,
        Role::Strobe,
        Role::Red,
        Role::Green,
        Role::Blue,
        Role::White,
        Role::Amber,
        Role::Uv,
        Role::Preset,
        Role::Sound,
    ];

    /// 1-based fixture-index of this role within a channel
    pub const fn fixture_index(self) -> usize {
        match self {
            Role::Dimmer => 1,
            Role::DimmerFine => 2,
            Role::Strobe => 3,
            Role::Red => 4,
            Role::Green => 5,
            Role::Blue => 6,
            Role::White => 7,
            Role::Amber => 8,
            Role::Uv => 9,
            Role::Preset => 10,
            Role::Sound => 11,
        }
    }

    /// Look up the role at the given 1-based fixture-index
    pub fn from_fixture_index(index: usize) -> Option<Role> {
        Role::ALL.get(index.checked_sub(1)?).copied()
    }

    /// Human-readable lowercase name, as used by the command surface
    pub fn name(self) -> &'static str {
        match self {
            Role::Dimmer => "dimmer",
            Role::DimmerFine => "dimmer_fine",
            Role::Strobe => "strobe",
            Role::Red => "red",
            Role::Green => "green",
            Role::Blue => "blue",
            Role::White => "white",
            Role::Amber => "amber",
            Role::Uv => "uv",
            Role::Preset => "preset",
            Role::Sound => "sound",
        }
    }

    /// Parse a role from its lowercase name
    pub fn from_name(name: &str) -> Option<Role> {
        Role::ALL.iter().copied().find(|r| r.name() == name)
    }
}

/// Name the role behind a 1-based fixture-index, for error messages.
///
/// Falls back to `fixture_N` for indices beyond the role table (channels
/// wider than the default width are legal).
pub fn describe_fixture_index(index: usize) -> String {
    match Role::from_fixture_index(index) {
        Some(role) => role.name().to_string(),
        None => format!("fixture_{index}"),
    }
}

/// Freshly allocated default-on state vector: dimmer at full, rest zero.
///
/// Every call returns an independently owned vector; fixtures never share
/// a default instance.
pub fn default_state(width: usize) -> Vec<u8> {
    let mut state = vec![0u8; width];
    if !state.is_empty() {
        state[0] = 255;
    }
    state
}

/// Freshly allocated all-zero state vector
pub fn reset_state(width: usize) -> Vec<u8> {
    vec![0u8; width]
}
