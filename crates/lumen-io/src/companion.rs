//! Bitfocus Companion config exporter
//!
//! Turns a preset group into a full Companion configuration: one button
//! per preset, each pressing the flattened `(slot, value)` pairs of that
//! preset into a generic-artnet instance as fading "set" actions. The
//! exporter only consumes the core's flattened view; it never touches
//! live fixtures.

use std::fs;
use std::path::Path;

use lumen_core::flatten_preset;
use lumen_core::preset::PresetGroup;
use rand::Rng;
use serde_json::{json, Map, Value};

use crate::error::Result;

/// Buttons per Companion page
pub const MAX_BUTTONS_PER_PAGE: u32 = 32;

/// Default action fade time in milliseconds
pub const DEFAULT_FADE_TIME_MS: u32 = 750;

/// Length of generated action ids
pub const DEFAULT_ID_LENGTH: usize = 21;

/// Default number of (empty) button pages in the exported config
pub const DEFAULT_PAGE_COUNT: u32 = 10;

const DEFAULT_INSTANCE_ID: &str = "TKdJlb-N6u8sGy0ufAlx1";

const ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Companion config generator
pub struct CompanionExporter {
    instance_id: String,
    id_length: usize,
    fade_time_ms: u32,
    pages: u32,
}

impl Default for CompanionExporter {
    fn default() -> Self {
        Self {
            instance_id: DEFAULT_INSTANCE_ID.to_string(),
            id_length: DEFAULT_ID_LENGTH,
            fade_time_ms: DEFAULT_FADE_TIME_MS,
            pages: DEFAULT_PAGE_COUNT,
        }
    }
}

impl CompanionExporter {
    /// Exporter with default instance id, fade time and page count
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the artnet instance id referenced by every action
    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = instance_id.into();
        self
    }

    /// Override the per-action fade time
    pub fn with_fade_time_ms(mut self, fade_time_ms: u32) -> Self {
        self.fade_time_ms = fade_time_ms;
        self
    }

    /// Build the full Companion config for one preset group.
    ///
    /// `light_names` and `channel_start` describe the rig's slot packing,
    /// exactly as the topology builder assigned it.
    pub fn export(
        &self,
        host: &str,
        universe: u16,
        presets: &PresetGroup,
        light_names: &[String],
        channel_start: usize,
    ) -> Value {
        let mut pages = Map::new();
        for page in 1..=self.pages {
            pages.insert(page.to_string(), json!({ "name": "PAGE" }));
        }

        let mut instances = Map::new();
        instances.insert(
            self.instance_id.clone(),
            json!({
                "instance_type": "generic-artnet",
                "sortOrder": 1,
                "label": "artnet",
                "isFirstInit": false,
                "config": {
                    "host": host,
                    "universe": universe,
                    "timer_slow": 1000,
                    "timer_fast": 40,
                },
                "enabled": true,
                "lastUpgradeIndex": 0,
            }),
        );

        json!({
            "version": 3,
            "type": "full",
            "pages": pages,
            "controls": self.controls(presets, light_names, channel_start),
            "instances": instances,
        })
    }

    /// Export one preset group straight to a JSON file
    pub fn export_to_file(
        &self,
        path: &Path,
        host: &str,
        universe: u16,
        presets: &PresetGroup,
        light_names: &[String],
        channel_start: usize,
    ) -> Result<()> {
        let config = self.export(host, universe, presets, light_names, channel_start);
        fs::write(path, serde_json::to_string_pretty(&config)?)?;
        tracing::info!("exported Companion config to {}", path.display());
        Ok(())
    }

    /// One button bank per preset, 32 buttons per page
    fn controls(
        &self,
        presets: &PresetGroup,
        light_names: &[String],
        channel_start: usize,
    ) -> Map<String, Value> {
        let mut controls = Map::new();
        let mut bank_id: u32 = 1;
        let mut button_id: u32 = 1;
        for (preset_name, preset) in presets {
            let pairs = flatten_preset(preset, light_names, channel_start);
            controls.insert(
                format!("bank:{bank_id}-{button_id}"),
                self.button(preset_name, &pairs),
            );
            if button_id == MAX_BUTTONS_PER_PAGE {
                bank_id += 1;
                button_id = 0;
            }
            button_id += 1;
        }
        controls
    }

    fn button(&self, preset_name: &str, pairs: &[(usize, u8)]) -> Value {
        let down: Vec<Value> = pairs
            .iter()
            .map(|&(slot, value)| self.channel_action(slot, value))
            .collect();

        json!({
            "type": "button",
            "style": {
                "text": preset_name,
                "size": "auto",
                "png": null,
                "alignment": "center:top",
                "pngalignment": "center:center",
                "color": 16777215,
                "bgcolor": 0,
                "show_topbar": true,
            },
            "options": { "relativeDelay": false, "stepAutoProgress": true },
            "feedbacks": [],
            "steps": {
                "0": {
                    "action_sets": { "down": down, "up": [] },
                    "options": { "runWhileHeld": [] },
                },
            },
        })
    }

    fn channel_action(&self, slot: usize, value: u8) -> Value {
        json!({
            "id": random_id(self.id_length),
            "action": "set",
            "instance": &self.instance_id,
            "options": {
                "channel": slot,
                "value": value,
                "duration": self.fade_time_ms,
            },
            "delay": 0,
        })
    }
}

/// Random ascii-letter id of the given length
fn random_id(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
        .collect()
}
