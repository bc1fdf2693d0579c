use ads_core::{Profile, Project, Resolver, ServiceSet};
use owo_colors::OwoColorize;

/// Headed sections of `key: value` lines with the keys right-aligned to one
/// shared column.
#[derive(Default)]
pub struct TreeListing {
	sections: Vec<Section>,
}

struct Section {
	heading: String,
	entries: Vec<(String, String)>,
	empty: Option<String>,
}

impl TreeListing {
	pub fn section(
		mut self,
		heading: impl Into<String>,
		entries: Vec<(String, String)>,
		empty: Option<&str>,
	) -> Self {
		self.sections.push(Section {
			heading: heading.into(),
			entries,
			empty: empty.map(String::from),
		});
		self
	}

	pub fn render(&self, color: bool) -> String {
		let width = match self
			.sections
			.iter()
			.flat_map(|s| s.entries.iter())
			.map(|(k, _)| k.chars().count())
			.max()
		{
			Some(w) => w + 1,
			None => return String::new(),
		};

		let mut out = String::new();
		for section in &self.sections {
			out.push('\n');
			if color {
				out.push_str(&section.heading.bold().to_string());
			} else {
				out.push_str(&section.heading);
			}
			out.push('\n');
			if section.entries.is_empty() {
				if let Some(empty) = &section.empty {
					out.push(' ');
					out.push_str(empty);
					out.push('\n');
				}
				continue;
			}
			for (key, value) in &section.entries {
				let key = format!("{:>width$}", key, width = width);
				if color {
					out.push_str(&format!("{}: {}\n", key.cyan(), value));
				} else {
					out.push_str(&format!("{}: {}\n", key, value));
				}
			}
		}
		out
	}
}

/// The `list` overview: services, groups and what runs when no names are given.
pub fn project_listing(project: &Project, profile: &Profile, resolver: &Resolver) -> TreeListing {
	let services = project
		.services
		.values()
		.map(|s| (s.name.clone(), s.description_or_default().to_string()))
		.collect();

	let default = resolver.default_selector();
	let summary = match resolver.resolve(&[default.to_string()]) {
		Ok(resolved) => match resolved.as_slice() {
			[only] if only.name == default => only.description_or_default().to_string(),
			_ => resolved.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(", "),
		},
		Err(e) => {
			tracing::debug!("default selector does not resolve: {}", e);
			"(Unresolved)".to_string()
		}
	};

	TreeListing::default()
		.section(
			format!("All services in current project ({}):", project.name),
			services,
			Some("None (create ads.yml files in this dir tree)"),
		)
		.section(
			"Groups defined in current project:",
			group_entries(&project.groups),
			Some("None (add 'groups' to adsroot.yml)"),
		)
		.section(
			"Groups defined in your ads profile:",
			group_entries(&profile.groups),
			Some("None (add 'groups' to ~/.ads_profile.yml)"),
		)
		.section(
			"Default service for commands if none are specified:",
			vec![(default.to_string(), summary)],
			None,
		)
}

fn group_entries(groups: &[ServiceSet]) -> Vec<(String, String)> {
	groups
		.iter()
		.map(|g| (g.name.clone(), g.selectors.join(", ")))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use ads_core::Service;
	use std::collections::BTreeMap;

	fn project() -> Project {
		let mut services = BTreeMap::new();
		let mut web = Service::new("web", "/work/web");
		web.description = Some("front end".into());
		services.insert("web".to_string(), web);
		services.insert("api".to_string(), Service::new("api", "/work/api"));
		Project {
			name: "shop".into(),
			home: "/work".into(),
			services,
			groups: vec![ServiceSet {
				name: "everything".into(),
				selectors: vec!["web".into(), "api".into()],
			}],
			default_selector: None,
		}
	}

	#[test]
	fn test_render_aligns_keys() {
		let listing = TreeListing::default()
			.section("One:", vec![("a".into(), "x".into()), ("long".into(), "y".into())], None)
			.section("Two:", Vec::new(), Some("nothing here"));
		assert_eq!(listing.render(false), "\nOne:\n    a: x\n long: y\n\nTwo:\n nothing here\n");
	}

	#[test]
	fn test_render_nothing_without_entries() {
		let listing = TreeListing::default().section("Empty:", Vec::new(), Some("none"));
		assert_eq!(listing.render(false), "");
	}

	#[test]
	fn test_project_listing() {
		let project = project();
		let profile = Profile::default();
		let resolver = Resolver::new(&project, &profile);
		let text = project_listing(&project, &profile, &resolver).render(false);
		assert_eq!(
			text,
			"\nAll services in current project (shop):\n\
			 \x20       api: (No description)\n\
			 \x20       web: front end\n\
			 \nGroups defined in current project:\n\
			 \x20everything: web, api\n\
			 \nGroups defined in your ads profile:\n\
			 \x20None (add 'groups' to ~/.ads_profile.yml)\n\
			 \nDefault service for commands if none are specified:\n\
			 \x20       all: api, web\n"
		);
	}

	#[test]
	fn test_single_service_default_shows_description() {
		let mut project = project();
		project.default_selector = Some("web".into());
		let profile = Profile::default();
		let resolver = Resolver::new(&project, &profile);
		let text = project_listing(&project, &profile, &resolver).render(false);
		assert!(text.ends_with("        web: front end\n"));
	}
}
