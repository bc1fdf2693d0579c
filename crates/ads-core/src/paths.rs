use std::path::PathBuf;

pub const PROFILE_FILE: &str = ".ads_profile.yml";
pub const CONFIG_FILE: &str = "config.toml";

/// Per-user locations read by ads.
///
/// Both lookups fall back the same way: an explicit override variable, then
/// `$HOME`, then `/tmp`. Variables set to an empty string count as unset.
///
/// | file | override | home fallback |
/// |---|---|---|
/// | `config.toml` | `$XDG_CONFIG_HOME/ads/` | `~/.config/ads/` |
/// | `.ads_profile.yml` | `$ADS_PROFILE_HOME/` | `~/` |
#[derive(Debug, Clone)]
pub struct AppPaths {
	pub app_name: String,
}

impl AppPaths {
	pub fn new(app_name: impl Into<String>) -> Self {
		Self {
			app_name: app_name.into(),
		}
	}

	pub fn config_dir(&self) -> PathBuf {
		self.config_dir_with(env)
	}

	pub fn config_path(&self) -> PathBuf {
		self.config_dir().join(CONFIG_FILE)
	}

	pub fn profile_path(&self) -> PathBuf {
		profile_path_with(env)
	}

	fn config_dir_with(&self, lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
		match (lookup("XDG_CONFIG_HOME"), lookup("HOME")) {
			(Some(xdg), _) => PathBuf::from(xdg).join(&self.app_name),
			(None, Some(home)) => PathBuf::from(home).join(".config").join(&self.app_name),
			(None, None) => PathBuf::from("/tmp").join(&self.app_name).join("config"),
		}
	}
}

impl Default for AppPaths {
	fn default() -> Self {
		Self::new("ads")
	}
}

fn profile_path_with(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
	let base = lookup("ADS_PROFILE_HOME")
		.or_else(|| lookup("HOME"))
		.unwrap_or_else(|| "/tmp".to_string());
	PathBuf::from(base).join(PROFILE_FILE)
}

fn env(key: &str) -> Option<String> {
	std::env::var(key).ok().filter(|v| !v.is_empty())
}
