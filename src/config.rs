use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::trackers::state_dir;

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_TICK_MS: u64 = 250;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	#[serde(default = "default_tick_ms")]
	pub tick_ms: u64,
	#[serde(default)]
	pub tracker: Option<PathBuf>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			tick_ms: DEFAULT_TICK_MS,
			tracker: None,
		}
	}
}

fn default_tick_ms() -> u64 {
	DEFAULT_TICK_MS
}

pub fn load_config() -> Config {
	let path = state_dir().join(CONFIG_FILE);
	let raw = match fs::read_to_string(&path) {
		Ok(raw) => raw,
		Err(_) => return Config::default(),
	};

	match toml::from_str(&raw) {
		Ok(config) => config,
		Err(err) => {
			eprintln!("warning: ignoring malformed config {}: {err}", path.display());
			Config::default()
		}
	}
}
