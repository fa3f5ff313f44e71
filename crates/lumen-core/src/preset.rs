//! Preset model
//!
//! A preset bank is three levels of named state: preset group → preset →
//! fixture name → state vector. The bank itself is plain data; loading
//! and saving it is the preset store's concern, replaying it goes through
//! the registry, and [`flatten_preset`] exposes the flat slot/value view
//! the config exporter consumes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LumenError, Result};
use crate::registry::FixtureRegistry;

/// One preset: fixture name → commanded state vector
pub type PresetState = BTreeMap<String, Vec<u8>>;

/// Named presets within one preset group
pub type PresetGroup = BTreeMap<String, PresetState>;

/// The full preset bank, keyed by preset group name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetBank {
    groups: BTreeMap<String, PresetGroup>,
}

impl PresetBank {
    /// Create an empty bank
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bank with the given (empty) preset groups
    pub fn with_groups<I: IntoIterator<Item = String>>(names: I) -> Self {
        Self {
            groups: names
                .into_iter()
                .map(|name| (name, PresetGroup::new()))
                .collect(),
        }
    }

    /// Preset group names, sorted
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Presets stored under one preset group
    pub fn presets_in(&self, group: &str) -> Result<&PresetGroup> {
        self.groups
            .get(group)
            .ok_or_else(|| LumenError::UnknownName(group.to_string()))
    }

    /// Look up one preset
    pub fn get(&self, group: &str, preset: &str) -> Result<&PresetState> {
        self.presets_in(group)?
            .get(preset)
            .ok_or_else(|| LumenError::UnknownName(preset.to_string()))
    }

    /// True when a preset with this name already exists in the group
    pub fn contains(&self, group: &str, preset: &str) -> bool {
        self.groups
            .get(group)
            .is_some_and(|g| g.contains_key(preset))
    }

    /// Store a preset, creating the group when needed
    pub fn insert(&mut self, group: &str, preset: &str, state: PresetState) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(preset.to_string(), state);
    }

    /// Replay a preset through the registry: every named fixture gets its
    /// stored state and is turned on.
    pub fn apply(&self, registry: &FixtureRegistry, group: &str, preset: &str) -> Result<()> {
        let state = self.get(group, preset)?;
        for (fixture_name, values) in state {
            registry.apply_preset(fixture_name, values)?;
        }
        tracing::debug!("applied preset '{preset}' from group '{group}'");
        Ok(())
    }
}

/// Flatten one preset into ordered `(absolute_slot, value)` pairs.
///
/// Only the named lights contribute, in the order given; their state
/// vectors are concatenated onto sequential slots starting at
/// `channel_start`, matching the sequential channel packing the topology
/// builder uses. This is the view the automation-config exporter consumes.
pub fn flatten_preset(
    preset: &PresetState,
    light_names: &[String],
    channel_start: usize,
) -> Vec<(usize, u8)> {
    let mut pairs = Vec::new();
    let mut slot = channel_start;
    for name in light_names {
        if let Some(values) = preset.get(name) {
            for &value in values {
                pairs.push((slot, value));
                slot += 1;
            }
        }
    }
    pairs
}
