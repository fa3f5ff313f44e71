//! Static topology configuration
//!
//! The fixture set is fixed for the process lifetime: lights, their
//! channel ranges and the group membership map are all described here,
//! read once at startup and turned into a transmitter plus a populated
//! registry. Channel ranges are validated for overlap before anything
//! touches the wire.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::artnet::{ArtNetTransmitter, ARTNET_PORT, DEFAULT_FPS, DEFAULT_PACKET_SIZE};
use crate::channel::{validate_no_overlap, Channel};
use crate::error::Result;
use crate::fixture::{Group, Light, SharedLightSource};
use crate::registry::FixtureRegistry;
use crate::role::DEFAULT_CHANNEL_WIDTH;

/// First DMX slot of the first channel
pub const DEFAULT_CHANNEL_START: usize = 1;

/// Number of lights in the default rig
pub const DEFAULT_LIGHT_COUNT: usize = 6;

/// Topology description, loadable from a toml file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Art-Net destination, ip:port
    pub target: String,
    /// Art-Net universe id
    pub universe: u16,
    /// Slots per frame
    pub packet_size: usize,
    /// Broadcast rate
    pub fps: u32,
    /// Enforce even frame length (some receivers reject odd frames)
    pub even_packet: bool,
    /// Enable broadcast on the socket
    pub broadcast: bool,
    /// Number of lights, addressed sequentially
    pub num_lights: usize,
    /// Fixture slots per light
    pub channel_width: usize,
    /// First slot of the first light's channel
    pub channel_start: usize,
    /// Group name → ordered member light names
    pub groups: BTreeMap<String, Vec<String>>,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        let mut groups = BTreeMap::new();
        groups.insert(
            "group_1".to_string(),
            vec!["light_1".into(), "light_3".into(), "light_5".into()],
        );
        groups.insert(
            "group_2".to_string(),
            vec!["light_2".into(), "light_4".into(), "light_6".into()],
        );
        Self {
            target: format!("255.255.255.255:{ARTNET_PORT}"),
            universe: 1,
            packet_size: DEFAULT_PACKET_SIZE,
            fps: DEFAULT_FPS,
            even_packet: true,
            broadcast: true,
            num_lights: DEFAULT_LIGHT_COUNT,
            channel_width: DEFAULT_CHANNEL_WIDTH,
            channel_start: DEFAULT_CHANNEL_START,
            groups,
        }
    }
}

impl TopologyConfig {
    /// Build the transmitter and a registry holding every light and group.
    ///
    /// Lights are named `light_1..light_N` and packed onto sequential
    /// channel ranges. Fails fast on invalid packet configuration,
    /// overlapping or out-of-universe channels, and group members that
    /// name no known light.
    pub fn build(&self) -> Result<(ArtNetTransmitter, FixtureRegistry)> {
        let tx = ArtNetTransmitter::new(
            &self.target,
            self.universe,
            self.packet_size,
            self.even_packet,
            self.broadcast,
        )?;

        let mut channels = Vec::with_capacity(self.num_lights);
        for i in 0..self.num_lights {
            let start_slot = self.channel_start + i * self.channel_width;
            channels.push(Channel::new(tx.clone(), start_slot, self.channel_width)?);
        }
        validate_no_overlap(&channels)?;

        let mut registry = FixtureRegistry::new();
        for (i, channel) in channels.into_iter().enumerate() {
            let light = Light::new(format!("light_{}", i + 1), channel)?;
            registry.insert(Arc::new(Mutex::new(light)))?;
        }

        for (group_name, member_names) in &self.groups {
            let mut group = Group::new(group_name.clone(), self.channel_width);
            for member_name in member_names {
                group.add_member(registry.resolve(member_name)?)?;
            }
            registry.insert(Arc::new(Mutex::new(group)) as SharedLightSource)?;
        }

        tracing::info!(
            "topology built: {} lights, {} groups, universe {} -> {}",
            self.num_lights,
            self.groups.len(),
            self.universe,
            self.target
        );
        Ok((tx, registry))
    }
}
