use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::types::{Profile, Project, Service, ServiceSet};

pub const ALL: &str = "all";
pub const DEFAULT: &str = "default";

/// Turns selectors into services.
///
/// A selector is `all`, `default`, a service name or a group name. Profile
/// groups shadow project groups with the same name.
pub struct Resolver<'a> {
	project: &'a Project,
	groups: HashMap<&'a str, &'a ServiceSet>,
	default_selector: &'a str,
}

impl<'a> Resolver<'a> {
	pub fn new(project: &'a Project, profile: &'a Profile) -> Self {
		let groups = project
			.groups
			.iter()
			.chain(profile.groups.iter())
			.map(|set| (set.name.as_str(), set))
			.collect();
		let default_selector = profile
			.default_selector
			.as_deref()
			.or(project.default_selector.as_deref())
			.unwrap_or(ALL);
		Self {
			project,
			groups,
			default_selector,
		}
	}

	pub fn default_selector(&self) -> &'a str {
		self.default_selector
	}

	/// Resolves `names` in order, dropping repeats.
	///
	/// No names means the default selector. The first selector that matches
	/// nothing fails the whole resolution.
	pub fn resolve(&self, names: &[String]) -> Result<Vec<&'a Service>> {
		let default = [self.default_selector.to_string()];
		let names = if names.is_empty() { &default[..] } else { names };

		let project = self.project;
		let mut seen = BTreeSet::new();
		let mut resolved = Vec::new();
		for name in names {
			for svc_name in self.expand(name)? {
				if seen.insert(svc_name) {
					resolved.push(&project.services[svc_name]);
				}
			}
		}
		Ok(resolved)
	}

	/// Like [`resolve`](Self::resolve), but an empty result is an error.
	pub fn resolve_nonempty(&self, names: &[String]) -> Result<Vec<&'a Service>> {
		let resolved = self.resolve(names)?;
		if resolved.is_empty() {
			let shown = if names.is_empty() { self.default_selector.to_string() } else { names.join(" ") };
			return Err(Error::NoMatch(shown));
		}
		Ok(resolved)
	}

	/// Expands one selector to the service names it denotes, sorted.
	pub fn expand(&self, selector: &str) -> Result<BTreeSet<&'a str>> {
		let selector = if selector == DEFAULT { self.default_selector } else { selector };
		let mut stack = Vec::new();
		self.expand_inner(selector, &mut stack)
	}

	fn expand_inner(&self, selector: &str, stack: &mut Vec<String>) -> Result<BTreeSet<&'a str>> {
		if stack.iter().any(|s| s == selector) {
			let mut chain = stack.clone();
			chain.push(selector.to_string());
			let start = chain.iter().position(|s| s == selector).unwrap_or(0);
			return Err(Error::CircularSelector {
				chain: chain[start..].to_vec(),
			});
		}

		let project = self.project;
		if selector == ALL {
			return Ok(project.services.keys().map(String::as_str).collect());
		}

		if let Some((name, _)) = project.services.get_key_value(selector) {
			return Ok(BTreeSet::from([name.as_str()]));
		}

		if let Some(set) = self.groups.get(selector) {
			stack.push(selector.to_string());
			let mut members = BTreeSet::new();
			for sub in &set.selectors {
				members.extend(self.expand_inner(sub, stack)?);
			}
			stack.pop();
			return Ok(members);
		}

		let mut chain = stack.clone();
		chain.push(selector.to_string());
		Err(Error::UnknownService {
			name: selector.to_string(),
			chain,
		})
	}
}

/// Resolves `names` against a project alone, without a per-user profile.
pub fn resolve<'a>(project: &'a Project, names: &[String]) -> Result<Vec<&'a Service>> {
	let resolver = Resolver {
		project,
		groups: project.groups.iter().map(|set| (set.name.as_str(), set)).collect(),
		default_selector: project.default_selector.as_deref().unwrap_or(ALL),
	};
	resolver.resolve(names)
}
