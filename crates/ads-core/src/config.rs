use crate::paths::AppPaths;
use crate::registry::DuplicatePolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Global config (~/.config/ads/config.toml) ───────────────────────────────

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GlobalConfig {
	#[serde(default)]
	pub shell: ShellConfig,
	#[serde(default)]
	pub registry: RegistryConfig,
	#[serde(default)]
	pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShellConfig {
	#[serde(default = "default_shell")]
	pub program: PathBuf,
}

impl Default for ShellConfig {
	fn default() -> Self {
		Self { program: default_shell() }
	}
}

fn default_shell() -> PathBuf { PathBuf::from("/bin/bash") }

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RegistryConfig {
	#[serde(default)]
	pub on_duplicate: DuplicatePolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
	#[serde(default = "default_true")]
	pub color: bool,
	#[serde(default)]
	pub quiet: bool,
}

impl Default for OutputConfig {
	fn default() -> Self {
		Self { color: true, quiet: false }
	}
}

fn default_true() -> bool { true }

pub fn load_global_config() -> GlobalConfig {
	load_config_from(&AppPaths::default().config_path())
}

/// Reads a config file, falling back to defaults when it is missing or broken.
pub fn load_config_from(path: &Path) -> GlobalConfig {
	if path.exists() {
		match std::fs::read_to_string(path) {
			Ok(content) => match toml::from_str(&content) {
				Ok(config) => return config,
				Err(e) => tracing::warn!("failed to parse {}: {}", path.display(), e),
			},
			Err(e) => tracing::warn!("failed to read {}: {}", path.display(), e),
		}
	}
	GlobalConfig::default()
}
