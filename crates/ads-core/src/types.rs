use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const NO_DESCRIPTION: &str = "(No description)";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Service {
	pub name: String,
	pub home: PathBuf,
	pub description: Option<String>,
	pub start_cmd: Option<String>,
	pub stop_cmd: Option<String>,
	pub status_cmd: Option<String>,
	pub log_paths: Vec<String>,
	pub err_log_paths: Vec<String>,
}

impl Service {
	pub fn new(name: impl Into<String>, home: impl Into<PathBuf>) -> Self {
		Self {
			name: name.into(),
			home: home.into(),
			description: None,
			start_cmd: None,
			stop_cmd: None,
			status_cmd: None,
			log_paths: Vec::new(),
			err_log_paths: Vec::new(),
		}
	}

	pub fn description_or_default(&self) -> &str {
		self.description.as_deref().unwrap_or(NO_DESCRIPTION)
	}

	pub fn command(&self, verb: Verb) -> Option<&str> {
		let cmd = match verb {
			Verb::Start => &self.start_cmd,
			Verb::Stop => &self.stop_cmd,
			Verb::Status => &self.status_cmd,
		};
		cmd.as_deref().filter(|c| !c.trim().is_empty())
	}

	pub fn definition_path(&self) -> PathBuf {
		self.home.join(crate::registry::SERVICE_FILE)
	}

	pub fn log_patterns(&self, kind: LogKind) -> &[String] {
		match kind {
			LogKind::General => &self.log_paths,
			LogKind::Error => &self.err_log_paths,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
	Start,
	Stop,
	Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogKind {
	#[default]
	General,
	Error,
}

impl LogKind {
	pub fn label(self) -> &'static str {
		match self {
			LogKind::General => "general",
			LogKind::Error => "error",
		}
	}
}

/// A named list of selectors.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServiceSet {
	pub name: String,
	pub selectors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Project {
	pub name: String,
	pub home: PathBuf,
	pub services: BTreeMap<String, Service>,
	pub groups: Vec<ServiceSet>,
	pub default_selector: Option<String>,
}

impl Project {
	pub fn get(&self, name: &str) -> Option<&Service> {
		self.services.get(name)
	}
}

/// Per-user groups and default selector.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Profile {
	pub groups: Vec<ServiceSet>,
	pub default_selector: Option<String>,
}
