use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::types::{LogKind, Service};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
	/// Follow appended output until interrupted.
	#[default]
	Tail,
	/// Print current contents once.
	Cat,
	/// Print the matching paths.
	List,
}

/// Every existing log file named by `services`, in declaration order.
///
/// Patterns are relative to each service's home and may be globs. A file
/// reachable from several services or patterns appears once, at its first
/// position.
pub fn collect_log_paths(services: &[&Service], kind: LogKind) -> Vec<PathBuf> {
	let mut seen = HashSet::new();
	let mut paths = Vec::new();
	for svc in services {
		for pattern in svc.log_patterns(kind) {
			for path in expand(&svc.home, pattern) {
				let path = path.canonicalize().unwrap_or(path);
				if seen.insert(path.clone()) {
					paths.push(path);
				}
			}
		}
	}
	paths
}

fn expand(home: &Path, pattern: &str) -> Vec<PathBuf> {
	if !pattern.contains(['*', '?', '[']) {
		let literal = home.join(pattern);
		return if literal.exists() { vec![literal] } else { Vec::new() };
	}
	let full = if Path::new(pattern).is_absolute() {
		pattern.to_string()
	} else {
		format!("{}/{}", Pattern::escape(&home.to_string_lossy()), pattern)
	};
	match glob::glob(&full) {
		Ok(matches) => matches.filter_map(|m| m.ok()).collect(),
		Err(e) => {
			tracing::warn!("bad log pattern '{}' in {}: {}", pattern, home.display(), e);
			let literal = home.join(pattern);
			if literal.exists() { vec![literal] } else { Vec::new() }
		}
	}
}

pub fn cat_command(paths: &[PathBuf]) -> String {
	format!("cat {}", quote_all(paths))
}

pub fn tail_command(paths: &[PathBuf]) -> String {
	format!("tail -F {}", quote_all(paths))
}

fn quote_all(paths: &[PathBuf]) -> String {
	paths
		.iter()
		.map(|p| shell_quote(&p.to_string_lossy()))
		.collect::<Vec<_>>()
		.join(" ")
}

/// Single-quotes `s` for a POSIX shell.
pub fn shell_quote(s: &str) -> String {
	format!("'{}'", s.replace('\'', "'\\''"))
}
