//! Lumen - headless ArtNet lighting controller
//!
//! Builds the rig from a static topology description, runs the periodic
//! Art-Net broadcast loop, and exposes a line-oriented command surface on
//! stdin for operator input (the interactive GUI this replaces talks to
//! the same dispatcher). On exit every fixture is turned off before the
//! broadcaster stops.

mod logging;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use lumen_core::{FixtureRegistry, PresetBank, Role, TopologyConfig};
use lumen_io::{load_presets, save_presets, CompanionExporter};

/// Operator configuration: where presets live, plus the rig topology
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct AppConfig {
    /// Path of the JSON preset bank
    presets_path: PathBuf,
    /// Rig description
    topology: TopologyConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            presets_path: PathBuf::from("presets/preset.json"),
            topology: TopologyConfig::default(),
        }
    }
}

impl AppConfig {
    /// Light names in channel order, as the topology builder assigns them
    fn light_names(&self) -> Vec<String> {
        (1..=self.topology.num_lights)
            .map(|i| format!("light_{i}"))
            .collect()
    }

    /// Host part of the Art-Net target, for the Companion export
    fn target_host(&self) -> &str {
        self.topology
            .target
            .rsplit_once(':')
            .map_or(self.topology.target.as_str(), |(host, _)| host)
    }
}

fn load_config(path: Option<&str>) -> Result<AppConfig> {
    match path {
        Some(path) => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {path}"))?;
            toml::from_str(&data).with_context(|| format!("invalid config file {path}"))
        }
        None => Ok(AppConfig::default()),
    }
}

fn main() -> Result<()> {
    logging::init();

    let config_path = std::env::args().nth(1);
    let config = load_config(config_path.as_deref())?;

    let (tx, registry) = config
        .topology
        .build()
        .context("failed to build lighting topology")?;

    let mut presets = match load_presets(&config.presets_path) {
        Ok(bank) => bank,
        Err(e) => {
            warn!("no preset bank loaded ({e}); starting with an empty one");
            PresetBank::with_groups(config.topology.groups.keys().cloned())
        }
    };

    let broadcast = tx.run(config.topology.fps)?;
    info!("lumen running; type 'help' for commands, 'quit' to exit");

    run_command_loop(&config, &registry, &mut presets)?;

    // Terminal state: everything off, then stop the broadcaster
    registry.shutdown_all();
    broadcast.stop();
    Ok(())
}

fn run_command_loop(
    config: &AppConfig,
    registry: &FixtureRegistry,
    presets: &mut PresetBank,
) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let args: Vec<&str> = line.split_whitespace().collect();
        match args.as_slice() {
            [] => continue,
            ["quit"] | ["exit"] => break,
            _ => {
                if let Err(e) = dispatch(&args, config, registry, presets) {
                    println!("error: {e:#}");
                }
            }
        }
    }
    Ok(())
}

fn dispatch(
    args: &[&str],
    config: &AppConfig,
    registry: &FixtureRegistry,
    presets: &mut PresetBank,
) -> Result<()> {
    match args {
        ["help"] => {
            println!("{HELP}");
        }
        ["list"] => {
            for name in registry.names() {
                println!("{name}");
            }
        }
        ["state", name] => {
            let source = registry.resolve(name)?;
            println!("{:?}", source.lock().state());
        }
        ["set", name, role, value] => {
            let role = Role::from_name(role)
                .with_context(|| format!("unknown role '{role}'"))?;
            registry.apply_value(name, role, parse_value(value)?)?;
        }
        ["rgb", name, r, g, b] => {
            registry.set_rgb(name, parse_value(r)?, parse_value(g)?, parse_value(b)?)?;
        }
        ["on", name] => registry.turn_on(name)?,
        ["off", name] => registry.turn_off(name)?,
        ["reset", name] => registry.reset(name)?,
        ["blink", name] => registry.blink(name, Duration::from_millis(200), 2)?,
        ["blink", name, time_ms, repeats] => {
            let time_ms: u64 = time_ms.parse().context("blink time must be milliseconds")?;
            let repeats: u32 = repeats.parse().context("repeats must be a number")?;
            registry.blink(name, Duration::from_millis(time_ms), repeats)?;
        }
        ["preset", "list"] => {
            for group in presets.group_names() {
                println!("{group}:");
                for name in presets.presets_in(group)?.keys() {
                    println!("  {name}");
                }
            }
        }
        ["preset", "apply", group, name] => {
            presets.apply(registry, group, name)?;
        }
        ["preset", "save", group, name] => {
            if presets.contains(group, name) {
                bail!("preset '{name}' already exists in '{group}'");
            }
            presets.insert(group, name, registry.snapshot_states());
            save_presets(&config.presets_path, presets)
                .with_context(|| format!("failed to save {}", config.presets_path.display()))?;
            info!("saved preset '{name}' to group '{group}'");
        }
        ["export", group, path] => {
            CompanionExporter::new().export_to_file(
                Path::new(path),
                config.target_host(),
                config.topology.universe,
                presets.presets_in(group)?,
                &config.light_names(),
                config.topology.channel_start,
            )?;
        }
        _ => bail!("unrecognized command; type 'help'"),
    }
    Ok(())
}

fn parse_value(raw: &str) -> Result<u16> {
    raw.parse()
        .with_context(|| format!("'{raw}' is not a fixture value"))
}

const HELP: &str = "\
commands:
  list                          registered lights and groups
  state <name>                  mirrored state vector
  set <name> <role> <value>     set one role (dimmer, red, uv, ...)
  rgb <name> <r> <g> <b>        set color
  on|off|reset <name>
  blink <name> [ms] [repeats]
  preset list
  preset apply <group> <name>
  preset save <group> <name>
  export <group> <path>         write Companion config for a preset group
  quit";
