//! Preset store - JSON load/save
//!
//! The preset bank lives in a single JSON file: preset group → preset →
//! fixture name → state vector. The core only ever needs these two
//! operations; where the file lives is the operator's concern.

use std::fs;
use std::path::Path;

use lumen_core::PresetBank;

use crate::error::Result;

/// Load the preset bank from a JSON file.
pub fn load_presets(path: &Path) -> Result<PresetBank> {
    let data = fs::read_to_string(path)?;
    let bank = serde_json::from_str(&data)?;
    tracing::debug!("loaded presets from {}", path.display());
    Ok(bank)
}

/// Save the preset bank to a JSON file, replacing any previous contents.
pub fn save_presets(path: &Path, bank: &PresetBank) -> Result<()> {
    let data = serde_json::to_string_pretty(bank)?;
    fs::write(path, data)?;
    tracing::debug!("saved presets to {}", path.display());
    Ok(())
}
