//! YAML formats: `ads.yml` per service, `adsroot.yml` per project and the
//! per-user `.ads_profile.yml`.

use crate::error::{Error, Result};
use crate::types::{Profile, Service, ServiceSet};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;

// ── ads.yml ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct ServiceDef {
	description: Option<String>,
	start_cmd: Option<String>,
	stop_cmd: Option<String>,
	status_cmd: Option<String>,
	log_paths: Option<Vec<String>>,
	err_log_paths: Option<Vec<String>>,
}

// ── adsroot.yml / .ads_profile.yml ───────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct RootDef {
	name: Option<String>,
	groups: Option<BTreeMap<String, Vec<String>>>,
	default: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProfileDef {
	groups: Option<BTreeMap<String, Vec<String>>>,
	default: Option<String>,
}

/// Contents of an `adsroot.yml`.
#[derive(Debug, Default)]
pub struct RootFile {
	pub name: Option<String>,
	pub groups: Vec<ServiceSet>,
	pub default_selector: Option<String>,
}

/// Loads a service definition; name and home come from where the file lives.
pub fn load_service(path: &Path) -> Result<Service> {
	let content = read(path)?;
	parse_service(&content, path)
}

pub fn parse_service(content: &str, path: &Path) -> Result<Service> {
	let def: ServiceDef = parse_mapping(content, path)?;
	let home = path.parent().ok_or_else(|| Error::Parse {
		path: path.to_path_buf(),
		message: "definition has no containing directory".into(),
	})?;
	let name = home
		.file_name()
		.map(|n| n.to_string_lossy().into_owned())
		.ok_or_else(|| Error::Parse {
			path: path.to_path_buf(),
			message: "cannot derive a service name from the containing directory".into(),
		})?;

	Ok(Service {
		name,
		home: home.to_path_buf(),
		description: def.description,
		start_cmd: def.start_cmd,
		stop_cmd: def.stop_cmd,
		status_cmd: def.status_cmd,
		log_paths: def.log_paths.unwrap_or_default(),
		err_log_paths: def.err_log_paths.unwrap_or_default(),
	})
}

pub fn load_root(path: &Path) -> Result<RootFile> {
	let def: RootDef = parse_mapping(&read(path)?, path)?;
	Ok(RootFile {
		name: def.name.filter(|n| !n.is_empty()),
		groups: into_sets(def.groups),
		default_selector: def.default.filter(|d| !d.is_empty()),
	})
}

/// A missing profile is an empty one.
pub fn load_profile(path: &Path) -> Result<Profile> {
	if !path.is_file() {
		return Ok(Profile::default());
	}
	let def: ProfileDef = parse_mapping(&read(path)?, path)?;
	Ok(Profile {
		groups: into_sets(def.groups),
		default_selector: def.default.filter(|d| !d.is_empty()),
	})
}

fn into_sets(groups: Option<BTreeMap<String, Vec<String>>>) -> Vec<ServiceSet> {
	groups
		.unwrap_or_default()
		.into_iter()
		.map(|(name, selectors)| ServiceSet { name, selectors })
		.collect()
}

fn read(path: &Path) -> Result<String> {
	std::fs::read_to_string(path).map_err(|source| Error::Io {
		path: path.to_path_buf(),
		source,
	})
}

fn parse_mapping<T: DeserializeOwned + Default>(content: &str, path: &Path) -> Result<T> {
	if is_blank(content) {
		return Ok(T::default());
	}
	let value: Value = serde_yaml::from_str(content).map_err(|e| parse_error(path, e))?;
	match value {
		Value::Null => Ok(T::default()),
		Value::Mapping(_) => serde_yaml::from_value(value).map_err(|e| parse_error(path, e)),
		other => Err(Error::Parse {
			path: path.to_path_buf(),
			message: format!("expected a mapping, got {}", value_kind(&other)),
		}),
	}
}

fn is_blank(content: &str) -> bool {
	content.lines().all(|l| {
		let l = l.trim();
		l.is_empty() || l.starts_with('#') || l == "---"
	})
}

fn parse_error(path: &Path, e: serde_yaml::Error) -> Error {
	Error::Parse {
		path: path.to_path_buf(),
		message: e.to_string(),
	}
}

fn value_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Sequence(_) => "a list",
		Value::Mapping(_) => "a mapping",
		Value::Tagged(_) => "a tagged value",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::PathBuf;

	#[test]
	fn test_parse_full_definition() {
		let path = Path::new("/work/proj/web/ads.yml");
		let yaml = "description: the web tier\nstart_cmd: |\n  ./run.sh &\n  echo started\nstop_cmd: pkill -f run.sh\nstatus_cmd: pgrep -f run.sh\nlog_paths:\n  - logs/*.log\nerr_log_paths:\n  - logs/err.log\n";
		let svc = parse_service(yaml, path).unwrap();
		assert_eq!(svc.name, "web");
		assert_eq!(svc.home, PathBuf::from("/work/proj/web"));
		assert_eq!(svc.description.as_deref(), Some("the web tier"));
		assert_eq!(svc.start_cmd.as_deref(), Some("./run.sh &\necho started\n"));
		assert_eq!(svc.log_paths, vec!["logs/*.log".to_string()]);
		assert_eq!(svc.err_log_paths, vec!["logs/err.log".to_string()]);
	}

	#[test]
	fn test_empty_definition() {
		let path = Path::new("/work/api/ads.yml");
		for content in ["", "\n\n", "# nothing yet\n", "---\n"] {
			let svc = parse_service(content, path).unwrap();
			assert_eq!(svc.name, "api");
			assert!(svc.start_cmd.is_none());
			assert!(svc.log_paths.is_empty());
			assert_eq!(svc.description_or_default(), "(No description)");
		}
	}

	#[test]
	fn test_non_mapping_is_rejected() {
		let path = Path::new("/work/api/ads.yml");
		let err = parse_service("- start\n- stop\n", path).unwrap_err();
		match err {
			Error::Parse { path: p, message } => {
				assert_eq!(p, path);
				assert!(message.contains("a list"), "message was: {}", message);
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn test_wrong_field_type_is_rejected() {
		let path = Path::new("/work/api/ads.yml");
		let err = parse_service("log_paths: 12\n", path).unwrap_err();
		assert!(matches!(err, Error::Parse { .. }));
	}

	#[test]
	fn test_root_and_profile() {
		let dir = tempfile::tempdir().unwrap();
		let root = dir.path().join("adsroot.yml");
		std::fs::write(&root, "name: shop\ngroups:\n  backend: [api, db]\ndefault: backend\n").unwrap();
		let parsed = load_root(&root).unwrap();
		assert_eq!(parsed.name.as_deref(), Some("shop"));
		assert_eq!(parsed.default_selector.as_deref(), Some("backend"));
		assert_eq!(
			parsed.groups,
			vec![ServiceSet { name: "backend".into(), selectors: vec!["api".into(), "db".into()] }]
		);

		let missing = load_profile(&dir.path().join(".ads_profile.yml")).unwrap();
		assert!(missing.groups.is_empty());
		assert!(missing.default_selector.is_none());
	}
}
