//! Light source hierarchy
//!
//! A [`LightSource`] is anything the command surface can address by name:
//! a [`Light`] backed by one channel, or a [`Group`] fanning every
//! operation out to its members. Both keep a mirrored state vector of one
//! byte per fixture-index; a group's mirror is its "last commanded look",
//! which can diverge from a member addressed directly after being added.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::channel::Channel;
use crate::error::{LumenError, Result};
use crate::role::{default_state, reset_state, Role};

/// A light source shared between the registry and any groups that claim it
pub type SharedLightSource = Arc<Mutex<dyn LightSource + Send>>;

/// Common capability set of lights and groups.
///
/// Every variant implements every operation; there are no default bodies,
/// so a new variant cannot silently ignore part of the contract.
pub trait LightSource: Send {
    /// Unique name, assigned at creation
    fn name(&self) -> &str;

    /// Mirrored state vector, one byte per fixture-index
    fn state(&self) -> &[u8];

    /// Name of the group currently claiming this source, if any
    fn group_name(&self) -> Option<&str>;

    /// Record or clear the claiming group (non-owning back-reference)
    fn set_group_name(&mut self, group: Option<String>);

    /// Update one role's value and mirror it into the state vector
    fn set_fixture_value(&mut self, role: Role, value: u16) -> Result<()>;

    /// Replace the entire state vector
    fn set_fixture_values(&mut self, values: &[u8]) -> Result<()>;

    /// Set the red, green and blue roles, in that fixed order
    fn set_rgb(&mut self, r: u16, g: u16, b: u16) -> Result<()>;

    /// Set the dimmer role to full
    fn turn_on(&mut self) -> Result<()>;

    /// Set the dimmer role to zero; "off" is indistinguishable from
    /// dimmer=0 everywhere else
    fn turn_off(&mut self) -> Result<()>;

    /// Drive every role to zero
    fn reset(&mut self) -> Result<()>;

    /// Scripted blink sequence: save state, flash white on/off
    /// `n_repeat` times, restore, turn on.
    ///
    /// Blocks the caller for `(2 * n_repeat + 1) * blink_time`; never call
    /// this from the broadcaster lane.
    fn blink(&mut self, blink_time: Duration, n_repeat: u32) -> Result<()>;
}

/// A single physical fixture backed by one channel
pub struct Light {
    name: String,
    group_name: Option<String>,
    channel: Channel,
    state: Vec<u8>,
}

impl Light {
    /// Create a light bound to `channel` and turn it on (default-on
    /// fixture policy: the dimmer goes to full immediately).
    pub fn new(name: impl Into<String>, channel: Channel) -> Result<Self> {
        let width = channel.width();
        let mut light = Self {
            name: name.into(),
            group_name: None,
            channel,
            // Freshly allocated per instance, never a shared default
            state: default_state(width),
        };
        light.turn_on()?;
        Ok(light)
    }

    /// Channel this light writes through
    pub fn channel(&self) -> &Channel {
        &self.channel
    }
}

impl LightSource for Light {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> &[u8] {
        &self.state
    }

    fn group_name(&self) -> Option<&str> {
        self.group_name.as_deref()
    }

    fn set_group_name(&mut self, group: Option<String>) {
        self.group_name = group;
    }

    fn set_fixture_value(&mut self, role: Role, value: u16) -> Result<()> {
        let index = role.fixture_index();
        // The channel validates index and value before the buffer changes
        self.channel.set_value(index, value, true)?;
        self.state[index - 1] = value as u8;
        Ok(())
    }

    fn set_fixture_values(&mut self, values: &[u8]) -> Result<()> {
        self.channel.set_values(values)?;
        self.state = values.to_vec();
        Ok(())
    }

    fn set_rgb(&mut self, r: u16, g: u16, b: u16) -> Result<()> {
        for (role, value) in [(Role::Red, r), (Role::Green, g), (Role::Blue, b)] {
            self.set_fixture_value(role, value)?;
        }
        Ok(())
    }

    fn turn_on(&mut self) -> Result<()> {
        self.set_fixture_value(Role::Dimmer, 255)
    }

    fn turn_off(&mut self) -> Result<()> {
        self.set_fixture_value(Role::Dimmer, 0)
    }

    fn reset(&mut self) -> Result<()> {
        self.channel.reset()?;
        self.state = reset_state(self.channel.width());
        Ok(())
    }

    fn blink(&mut self, blink_time: Duration, n_repeat: u32) -> Result<()> {
        let saved = self.state.clone();
        self.turn_off()?;
        std::thread::sleep(blink_time);
        self.reset()?;
        self.set_fixture_value(Role::White, 255)?;
        for _ in 0..n_repeat {
            std::thread::sleep(blink_time);
            self.turn_on()?;
            std::thread::sleep(blink_time);
            self.turn_off()?;
        }
        self.set_fixture_values(&saved)?;
        self.turn_on()
    }
}

/// A named fan-out aggregate of lights (or nested groups)
pub struct Group {
    name: String,
    group_name: Option<String>,
    members: Vec<SharedLightSource>,
    member_names: HashSet<String>,
    state: Vec<u8>,
    width: usize,
}

impl Group {
    /// Create an empty group commanding `width`-slot state vectors
    pub fn new(name: impl Into<String>, width: usize) -> Self {
        Self {
            name: name.into(),
            group_name: None,
            members: Vec::new(),
            member_names: HashSet::new(),
            state: default_state(width),
            width,
        }
    }

    /// Add a member.
    ///
    /// Fails without touching membership when the name is already present
    /// or the member is claimed by a different group. On success the
    /// group's current state is applied to the newcomer, so it inherits
    /// the group's last commanded look rather than its own prior state.
    pub fn add_member(&mut self, member: SharedLightSource) -> Result<()> {
        {
            let mut locked = member.lock();
            let member_name = locked.name().to_string();
            if self.member_names.contains(&member_name) {
                return Err(LumenError::DuplicateName(member_name));
            }
            if let Some(owner) = locked.group_name() {
                if owner != self.name {
                    return Err(LumenError::AlreadyGrouped {
                        light: member_name,
                        group: owner.to_string(),
                    });
                }
            }
            locked.set_fixture_values(&self.state)?;
            locked.set_group_name(Some(self.name.clone()));
            self.member_names.insert(member_name);
        }
        self.members.push(member);
        Ok(())
    }

    /// Remove the member registered under `name`.
    ///
    /// The removed member has its back-reference cleared and is reset to
    /// default-off; the remaining members are left untouched.
    pub fn remove_member(&mut self, name: &str) -> Result<()> {
        let position = self
            .members
            .iter()
            .position(|m| m.lock().name() == name)
            .ok_or_else(|| LumenError::UnknownName(name.to_string()))?;
        let member = self.members.remove(position);
        self.member_names.remove(name);
        let mut locked = member.lock();
        locked.set_group_name(None);
        locked.reset()
    }

    /// Number of direct members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True when the group has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Names of the direct members, in insertion order
    pub fn member_names(&self) -> Vec<String> {
        self.members
            .iter()
            .map(|m| m.lock().name().to_string())
            .collect()
    }
}

impl LightSource for Group {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> &[u8] {
        &self.state
    }

    fn group_name(&self) -> Option<&str> {
        self.group_name.as_deref()
    }

    fn set_group_name(&mut self, group: Option<String>) {
        self.group_name = group;
    }

    fn set_fixture_value(&mut self, role: Role, value: u16) -> Result<()> {
        // Validate once up front so a bad value rejects before any
        // member is touched
        let byte = u8::try_from(value).map_err(|_| LumenError::Range {
            role: role.name().to_string(),
            value,
        })?;
        for member in &self.members {
            member.lock().set_fixture_value(role, value)?;
        }
        let index = role.fixture_index();
        if index <= self.width {
            self.state[index - 1] = byte;
        }
        Ok(())
    }

    fn set_fixture_values(&mut self, values: &[u8]) -> Result<()> {
        if values.len() != self.width {
            return Err(LumenError::WidthMismatch {
                expected: self.width,
                actual: values.len(),
            });
        }
        for member in &self.members {
            member.lock().set_fixture_values(values)?;
        }
        self.state = values.to_vec();
        Ok(())
    }

    fn set_rgb(&mut self, r: u16, g: u16, b: u16) -> Result<()> {
        for (role, value) in [(Role::Red, r), (Role::Green, g), (Role::Blue, b)] {
            self.set_fixture_value(role, value)?;
        }
        Ok(())
    }

    fn turn_on(&mut self) -> Result<()> {
        self.set_fixture_value(Role::Dimmer, 255)
    }

    fn turn_off(&mut self) -> Result<()> {
        self.set_fixture_value(Role::Dimmer, 0)
    }

    fn reset(&mut self) -> Result<()> {
        for member in &self.members {
            member.lock().reset()?;
        }
        self.state = reset_state(self.width);
        Ok(())
    }

    fn blink(&mut self, blink_time: Duration, n_repeat: u32) -> Result<()> {
        for member in &self.members {
            member.lock().blink(blink_time, n_repeat)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artnet::{ArtNetTransmitter, DEFAULT_PACKET_SIZE};
    use crate::role::DEFAULT_CHANNEL_WIDTH;

    fn transmitter() -> ArtNetTransmitter {
        ArtNetTransmitter::new("255.255.255.255:6454", 0, DEFAULT_PACKET_SIZE, true, true)
            .unwrap()
    }

    fn light(tx: &ArtNetTransmitter, name: &str, start_slot: usize) -> SharedLightSource {
        let channel = Channel::new(tx.clone(), start_slot, DEFAULT_CHANNEL_WIDTH).unwrap();
        Arc::new(Mutex::new(Light::new(name, channel).unwrap()))
    }

    #[test]
    fn test_light_turns_on_at_creation() {
        let tx = transmitter();
        let channel = Channel::new(tx.clone(), 1, DEFAULT_CHANNEL_WIDTH).unwrap();
        let light = Light::new("light_1", channel).unwrap();

        assert_eq!(light.state()[0], 255);
        assert!(light.state()[1..].iter().all(|&v| v == 0));
        assert_eq!(tx.snapshot()[0], 255);
    }

    #[test]
    fn test_light_rgb_mirrors_state_and_buffer() {
        let tx = transmitter();
        let channel = Channel::new(tx.clone(), 1, DEFAULT_CHANNEL_WIDTH).unwrap();
        let mut light = Light::new("light_1", channel).unwrap();

        light.set_rgb(10, 20, 30).unwrap();

        assert_eq!(light.state()[Role::Red.fixture_index() - 1], 10);
        assert_eq!(light.state()[Role::Green.fixture_index() - 1], 20);
        assert_eq!(light.state()[Role::Blue.fixture_index() - 1], 30);
        // Dimmer untouched by a color change
        assert_eq!(light.state()[0], 255);

        let buffer = tx.snapshot();
        assert_eq!(buffer[3], 10);
        assert_eq!(buffer[4], 20);
        assert_eq!(buffer[5], 30);
    }

    #[test]
    fn test_light_set_values_updates_channel_range() {
        let tx = transmitter();
        let channel = Channel::new(tx.clone(), 12, DEFAULT_CHANNEL_WIDTH).unwrap();
        let mut light = Light::new("light_2", channel).unwrap();

        let values: Vec<u8> = (1..=11).collect();
        light.set_fixture_values(&values).unwrap();

        assert_eq!(light.state(), values.as_slice());
        assert_eq!(&tx.snapshot()[11..22], values.as_slice());
    }

    #[test]
    fn test_light_rejects_bad_value_and_keeps_state() {
        let tx = transmitter();
        let channel = Channel::new(tx.clone(), 1, DEFAULT_CHANNEL_WIDTH).unwrap();
        let mut light = Light::new("light_1", channel).unwrap();

        let before = light.state().to_vec();
        assert!(light.set_fixture_value(Role::Red, 256).is_err());
        assert_eq!(light.state(), before.as_slice());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let tx = transmitter();
        let channel = Channel::new(tx.clone(), 1, DEFAULT_CHANNEL_WIDTH).unwrap();
        let mut light = Light::new("light_1", channel).unwrap();

        light.reset().unwrap();
        let first = light.state().to_vec();
        light.reset().unwrap();
        assert_eq!(light.state(), first.as_slice());
        assert!(first.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_group_fans_out_to_every_member() {
        let tx = transmitter();
        let members = [
            light(&tx, "light_1", 1),
            light(&tx, "light_3", 23),
            light(&tx, "light_5", 45),
        ];
        let mut group = Group::new("group_1", DEFAULT_CHANNEL_WIDTH);
        for m in &members {
            group.add_member(m.clone()).unwrap();
        }

        group.turn_off().unwrap();

        for m in &members {
            assert_eq!(m.lock().state()[0], 0);
        }
        assert_eq!(group.state()[0], 0);

        group.set_fixture_value(Role::Uv, 77).unwrap();
        for m in &members {
            assert_eq!(m.lock().state()[Role::Uv.fixture_index() - 1], 77);
        }
        assert_eq!(group.state()[Role::Uv.fixture_index() - 1], 77);
    }

    #[test]
    fn test_new_member_inherits_group_state() {
        let tx = transmitter();
        let mut group = Group::new("group_1", DEFAULT_CHANNEL_WIDTH);
        group.set_rgb(1, 2, 3).unwrap();

        let newcomer = light(&tx, "light_1", 1);
        group.add_member(newcomer.clone()).unwrap();

        assert_eq!(newcomer.lock().state(), group.state());
        assert_eq!(newcomer.lock().group_name(), Some("group_1"));
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let tx = transmitter();
        let mut group = Group::new("group_1", DEFAULT_CHANNEL_WIDTH);
        group.add_member(light(&tx, "light_1", 1)).unwrap();

        let twin = light(&tx, "light_1", 23);
        let err = group.add_member(twin).unwrap_err();
        assert!(matches!(err, LumenError::DuplicateName(_)));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_member_of_another_group_rejected() {
        let tx = transmitter();
        let shared = light(&tx, "light_1", 1);

        let mut group_1 = Group::new("group_1", DEFAULT_CHANNEL_WIDTH);
        group_1.add_member(shared.clone()).unwrap();

        let mut group_2 = Group::new("group_2", DEFAULT_CHANNEL_WIDTH);
        let err = group_2.add_member(shared).unwrap_err();
        assert!(matches!(err, LumenError::AlreadyGrouped { .. }));
        assert!(group_2.is_empty());
    }

    #[test]
    fn test_remove_member_resets_only_the_removed() {
        let tx = transmitter();
        let a = light(&tx, "light_1", 1);
        let b = light(&tx, "light_3", 23);

        let mut group = Group::new("group_1", DEFAULT_CHANNEL_WIDTH);
        group.add_member(a.clone()).unwrap();
        group.add_member(b.clone()).unwrap();
        group.set_rgb(10, 20, 30).unwrap();

        group.remove_member("light_1").unwrap();

        // Removed member is reset and unclaimed
        assert!(a.lock().state().iter().all(|&v| v == 0));
        assert_eq!(a.lock().group_name(), None);

        // Remaining member keeps the last commanded look
        assert_eq!(b.lock().state()[Role::Red.fixture_index() - 1], 10);
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_removing_unknown_member_fails() {
        let mut group = Group::new("group_1", DEFAULT_CHANNEL_WIDTH);
        assert!(matches!(
            group.remove_member("light_9"),
            Err(LumenError::UnknownName(_))
        ));
    }

    #[test]
    fn test_nested_group_fan_out_is_depth_first() {
        let tx = transmitter();
        let leaf = light(&tx, "light_1", 1);

        let mut inner = Group::new("inner", DEFAULT_CHANNEL_WIDTH);
        inner.add_member(leaf.clone()).unwrap();

        let mut outer = Group::new("outer", DEFAULT_CHANNEL_WIDTH);
        outer
            .add_member(Arc::new(Mutex::new(inner)) as SharedLightSource)
            .unwrap();

        outer.set_fixture_value(Role::Amber, 42).unwrap();
        assert_eq!(leaf.lock().state()[Role::Amber.fixture_index() - 1], 42);
    }

    #[test]
    fn test_blink_restores_saved_state() {
        let tx = transmitter();
        let channel = Channel::new(tx.clone(), 1, DEFAULT_CHANNEL_WIDTH).unwrap();
        let mut light = Light::new("light_1", channel).unwrap();
        light.set_rgb(10, 20, 30).unwrap();
        let saved = light.state().to_vec();

        light.blink(Duration::from_millis(1), 1).unwrap();

        assert_eq!(light.state(), saved.as_slice());
        assert_eq!(light.state()[0], 255);
    }
}
