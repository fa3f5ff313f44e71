//! Lumen Core - ArtNet/DMX lighting control
//!
//! This crate maps a hierarchy of logical lighting controls — individual
//! lights grouped into named collections — onto the flat, fixed-width DMX
//! slot space of one Art-Net universe, and keeps the slot buffer, the
//! in-memory state mirror, and the physical devices consistent under
//! concurrent updates and periodic retransmission.
//!
//! ## Modules
//!
//! - [`artnet`] - Outbound frame buffer and fixed-rate broadcast loop
//! - [`channel`] - Fixture-index → absolute slot addressing
//! - [`role`] - Immutable role ↔ fixture-index table
//! - [`fixture`] - The [`LightSource`] hierarchy: [`Light`] and [`Group`]
//! - [`registry`] - Name lookup and the command dispatcher surface
//! - [`topology`] - Static rig description, validated at startup
//! - [`preset`] - Preset bank model and export flattening
//! - [`error`] - Error types
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lumen_core::{Role, TopologyConfig};
//!
//! # fn main() -> lumen_core::Result<()> {
//! let (tx, registry) = TopologyConfig::default().build()?;
//! let broadcast = tx.run(40)?;
//!
//! registry.set_rgb("group_1", 255, 40, 0)?;
//! registry.apply_value("light_2", Role::Dimmer, 128)?;
//!
//! registry.shutdown_all();
//! broadcast.stop();
//! # Ok(())
//! # }
//! ```

/// Art-Net transmitter and broadcast loop
pub mod artnet;
/// Channel addressing and overlap validation
pub mod channel;
/// Error types
pub mod error;
/// Light source hierarchy
pub mod fixture;
/// Preset bank and flattening
pub mod preset;
/// Name registry and dispatcher
pub mod registry;
/// Role table
pub mod role;
/// Static topology configuration
pub mod topology;

pub use artnet::{ArtNetTransmitter, BroadcastHandle, ARTNET_PORT, DEFAULT_FPS, DEFAULT_PACKET_SIZE};
pub use channel::{validate_no_overlap, Channel};
pub use error::{LumenError, Result};
pub use fixture::{Group, Light, LightSource, SharedLightSource};
pub use preset::{flatten_preset, PresetBank, PresetState};
pub use registry::FixtureRegistry;
pub use role::{default_state, Role, DEFAULT_CHANNEL_WIDTH};
pub use topology::TopologyConfig;
