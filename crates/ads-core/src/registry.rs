use crate::definition::{self, RootFile};
use crate::error::{Error, Result};
use crate::types::{Project, Service};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

pub const SERVICE_FILE: &str = "ads.yml";
pub const ROOT_FILE: &str = "adsroot.yml";

/// What to do when two definitions resolve to the same service name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
	/// Fail the build, naming both definitions.
	#[default]
	Reject,
	/// Keep whichever definition the sorted traversal reaches last.
	LastWins,
}

pub struct ProjectBuilder {
	name: String,
	home: PathBuf,
	policy: DuplicatePolicy,
	services: BTreeMap<String, Service>,
	origins: HashMap<String, PathBuf>,
	root_file: RootFile,
}

impl ProjectBuilder {
	pub fn new(home: impl Into<PathBuf>) -> Self {
		let home = home.into();
		let name = home
			.file_name()
			.map(|n| n.to_string_lossy().into_owned())
			.unwrap_or_else(|| home.display().to_string());
		Self {
			name,
			home,
			policy: DuplicatePolicy::default(),
			services: BTreeMap::new(),
			origins: HashMap::new(),
			root_file: RootFile::default(),
		}
	}

	pub fn on_duplicate(mut self, policy: DuplicatePolicy) -> Self {
		self.policy = policy;
		self
	}

	pub fn root_file(mut self, root_file: RootFile) -> Self {
		if let Some(name) = &root_file.name {
			self.name = name.clone();
		}
		self.root_file = root_file;
		self
	}

	pub fn insert(&mut self, service: Service, origin: PathBuf) -> Result<()> {
		if let Some(first) = self.origins.get(&service.name) {
			match self.policy {
				DuplicatePolicy::Reject => {
					return Err(Error::DuplicateService {
						name: service.name,
						first: first.clone(),
						second: origin,
					});
				}
				DuplicatePolicy::LastWins => {
					tracing::warn!(
						"service '{}' from {} replaces {}",
						service.name,
						origin.display(),
						first.display()
					);
				}
			}
		}
		self.origins.insert(service.name.clone(), origin);
		self.services.insert(service.name.clone(), service);
		Ok(())
	}

	pub fn build(self) -> Project {
		Project {
			name: self.name,
			home: self.home,
			services: self.services,
			groups: self.root_file.groups,
			default_selector: self.root_file.default_selector,
		}
	}
}

/// Builds the project rooted at `root` by collecting every `ads.yml` below it.
///
/// Traversal is sorted by file name, so the outcome of [`DuplicatePolicy::LastWins`]
/// does not depend on the filesystem. Subdirectories holding their own
/// `adsroot.yml` belong to a different project and are skipped.
pub fn build(root: &Path, policy: DuplicatePolicy) -> Result<Project> {
	let root = absolute(root)?;
	let root_yml = root.join(ROOT_FILE);
	let root_file = if root_yml.is_file() {
		definition::load_root(&root_yml)?
	} else {
		RootFile::default()
	};

	let mut builder = ProjectBuilder::new(&root).on_duplicate(policy).root_file(root_file);

	let walker = WalkDir::new(&root)
		.sort_by_file_name()
		.into_iter()
		.filter_entry(|e| !is_nested_project(e, &root));

	for entry in walker {
		let entry = entry.map_err(|source| Error::Walk {
			root: root.clone(),
			source,
		})?;
		if !entry.file_type().is_file() || entry.file_name() != SERVICE_FILE {
			continue;
		}
		let path = entry.into_path();
		tracing::debug!("loading {}", path.display());
		let service = definition::load_service(&path)?;
		builder.insert(service, path)?;
	}

	let project = builder.build();
	tracing::debug!(
		"project '{}' at {} has {} services",
		project.name,
		project.home.display(),
		project.services.len()
	);
	Ok(project)
}

/// Finds the enclosing project of `start` and builds it.
///
/// Walks upward for an `adsroot.yml`; without one, `start` itself is the root.
pub fn load_project(start: &Path, policy: DuplicatePolicy) -> Result<Project> {
	let start = absolute(start)?;
	let root = find_project_root(&start).unwrap_or(start);
	build(&root, policy)
}

pub fn find_project_root(start: &Path) -> Option<PathBuf> {
	start
		.ancestors()
		.find(|dir| dir.join(ROOT_FILE).is_file())
		.map(Path::to_path_buf)
}

fn is_nested_project(entry: &DirEntry, root: &Path) -> bool {
	entry.file_type().is_dir() && entry.path() != root && entry.path().join(ROOT_FILE).is_file()
}

fn absolute(path: &Path) -> Result<PathBuf> {
	path.canonicalize().map_err(|source| Error::Io {
		path: path.to_path_buf(),
		source,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_builder_rejects_duplicates() {
		let mut builder = ProjectBuilder::new("/work");
		builder
			.insert(Service::new("web", "/work/a/web"), PathBuf::from("/work/a/web/ads.yml"))
			.unwrap();
		let err = builder
			.insert(Service::new("web", "/work/b/web"), PathBuf::from("/work/b/web/ads.yml"))
			.unwrap_err();
		match err {
			Error::DuplicateService { name, first, second } => {
				assert_eq!(name, "web");
				assert_eq!(first, PathBuf::from("/work/a/web/ads.yml"));
				assert_eq!(second, PathBuf::from("/work/b/web/ads.yml"));
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn test_builder_last_wins() {
		let mut builder = ProjectBuilder::new("/work").on_duplicate(DuplicatePolicy::LastWins);
		builder
			.insert(Service::new("web", "/work/a/web"), PathBuf::from("/work/a/web/ads.yml"))
			.unwrap();
		builder
			.insert(Service::new("web", "/work/b/web"), PathBuf::from("/work/b/web/ads.yml"))
			.unwrap();
		let project = builder.build();
		assert_eq!(project.services.len(), 1);
		assert_eq!(project.services["web"].home, PathBuf::from("/work/b/web"));
	}

	#[test]
	fn test_project_named_after_root() {
		let project = ProjectBuilder::new("/work/shop").build();
		assert_eq!(project.name, "shop");

		let named = ProjectBuilder::new("/work/shop")
			.root_file(RootFile { name: Some("store".into()), ..RootFile::default() })
			.build();
		assert_eq!(named.name, "store");
	}
}
