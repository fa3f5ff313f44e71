//! Name registry and command dispatcher
//!
//! External collaborators (operator surface, preset replay) address
//! fixtures purely by name. The registry owns the name lookup, built once
//! at startup; callers never need to know whether a name resolves to a
//! light or a group, only the common capability set.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::error::{LumenError, Result};
use crate::fixture::SharedLightSource;
use crate::role::Role;

/// Name → light source lookup with the dispatcher surface on top
#[derive(Default)]
pub struct FixtureRegistry {
    sources: HashMap<String, SharedLightSource>,
    // Insertion order, for deterministic listings and shutdown
    order: Vec<String>,
}

impl FixtureRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a light source under its own name.
    ///
    /// Names are unique across lights and groups.
    pub fn insert(&mut self, source: SharedLightSource) -> Result<()> {
        let name = source.lock().name().to_string();
        if self.sources.contains_key(&name) {
            return Err(LumenError::DuplicateName(name));
        }
        self.order.push(name.clone());
        self.sources.insert(name, source);
        Ok(())
    }

    /// Resolve a name to its light source
    pub fn resolve(&self, name: &str) -> Result<SharedLightSource> {
        self.sources
            .get(name)
            .cloned()
            .ok_or_else(|| LumenError::UnknownName(name.to_string()))
    }

    /// Registered names in insertion order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Apply one role value to the named source
    pub fn apply_value(&self, name: &str, role: Role, value: u16) -> Result<()> {
        self.resolve(name)?.lock().set_fixture_value(role, value)
    }

    /// Replace the named source's whole state vector (preset replay)
    pub fn apply_preset(&self, name: &str, values: &[u8]) -> Result<()> {
        let source = self.resolve(name)?;
        let mut locked = source.lock();
        locked.set_fixture_values(values)?;
        locked.turn_on()
    }

    /// Set the named source's color
    pub fn set_rgb(&self, name: &str, r: u16, g: u16, b: u16) -> Result<()> {
        self.resolve(name)?.lock().set_rgb(r, g, b)
    }

    /// Turn the named source on
    pub fn turn_on(&self, name: &str) -> Result<()> {
        self.resolve(name)?.lock().turn_on()
    }

    /// Turn the named source off
    pub fn turn_off(&self, name: &str) -> Result<()> {
        self.resolve(name)?.lock().turn_off()
    }

    /// Reset the named source to all-zero state
    pub fn reset(&self, name: &str) -> Result<()> {
        self.resolve(name)?.lock().reset()
    }

    /// Blink the named source; blocks for the full sequence
    pub fn blink(&self, name: &str, blink_time: Duration, n_repeat: u32) -> Result<()> {
        self.resolve(name)?.lock().blink(blink_time, n_repeat)
    }

    /// Snapshot every source's mirrored state, keyed by name
    pub fn snapshot_states(&self) -> BTreeMap<String, Vec<u8>> {
        self.sources
            .iter()
            .map(|(name, source)| (name.clone(), source.lock().state().to_vec()))
            .collect()
    }

    /// Turn every registered source off (dimmer to zero).
    ///
    /// Terminal state before the broadcaster stops; failures are logged
    /// and the sweep continues so one bad fixture cannot keep the rest lit.
    pub fn shutdown_all(&self) {
        for name in &self.order {
            if let Err(e) = self.turn_off(name) {
                tracing::warn!("failed to turn off '{name}' during shutdown: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artnet::{ArtNetTransmitter, DEFAULT_PACKET_SIZE};
    use crate::channel::Channel;
    use crate::fixture::{Group, Light};
    use crate::role::DEFAULT_CHANNEL_WIDTH;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn registry_with_two_lights() -> (ArtNetTransmitter, FixtureRegistry) {
        let tx =
            ArtNetTransmitter::new("255.255.255.255:6454", 0, DEFAULT_PACKET_SIZE, true, true)
                .unwrap();
        let mut registry = FixtureRegistry::new();
        for (name, start) in [("light_1", 1), ("light_2", 12)] {
            let channel = Channel::new(tx.clone(), start, DEFAULT_CHANNEL_WIDTH).unwrap();
            registry
                .insert(Arc::new(Mutex::new(Light::new(name, channel).unwrap())))
                .unwrap();
        }
        (tx, registry)
    }

    #[test]
    fn test_resolve_unknown_name() {
        let (_tx, registry) = registry_with_two_lights();
        assert!(matches!(
            registry.resolve("light_9"),
            Err(LumenError::UnknownName(_))
        ));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let (tx, mut registry) = registry_with_two_lights();
        let channel = Channel::new(tx, 23, DEFAULT_CHANNEL_WIDTH).unwrap();
        let twin = Arc::new(Mutex::new(Light::new("light_1", channel).unwrap()));
        assert!(matches!(
            registry.insert(twin),
            Err(LumenError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_apply_value_by_name() {
        let (tx, registry) = registry_with_two_lights();
        registry.apply_value("light_2", Role::Blue, 123).unwrap();

        let source = registry.resolve("light_2").unwrap();
        assert_eq!(source.lock().state()[Role::Blue.fixture_index() - 1], 123);
        // light_2 starts at slot 12; blue is fixture-index 6 -> slot 17
        assert_eq!(tx.snapshot()[16], 123);
    }

    #[test]
    fn test_apply_preset_turns_on() {
        let (_tx, registry) = registry_with_two_lights();
        let mut values = vec![0u8; DEFAULT_CHANNEL_WIDTH];
        values[5] = 200;
        registry.apply_preset("light_1", &values).unwrap();

        let source = registry.resolve("light_1").unwrap();
        let state = source.lock().state().to_vec();
        assert_eq!(state[5], 200);
        assert_eq!(state[0], 255); // preset replay ends turned on
    }

    #[test]
    fn test_groups_resolve_through_the_same_surface() {
        let (tx, mut registry) = registry_with_two_lights();
        let mut group = Group::new("group_1", DEFAULT_CHANNEL_WIDTH);
        group
            .add_member(registry.resolve("light_1").unwrap())
            .unwrap();
        registry.insert(Arc::new(Mutex::new(group))).unwrap();

        registry.apply_value("group_1", Role::Green, 44).unwrap();
        assert_eq!(tx.snapshot()[4], 44);
    }

    #[test]
    fn test_shutdown_turns_everything_off() {
        let (tx, registry) = registry_with_two_lights();
        registry.shutdown_all();

        for name in registry.names() {
            let source = registry.resolve(name).unwrap();
            assert_eq!(source.lock().state()[0], 0);
        }
        let buffer = tx.snapshot();
        assert_eq!(buffer[0], 0);
        assert_eq!(buffer[11], 0);
    }
}
