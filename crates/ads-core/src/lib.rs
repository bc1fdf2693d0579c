//! # ads-core
//!
//! Finds the services declared by `ads.yml` files under a project root and
//! drives them with the shell snippets those files declare.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use ads_core::{registry, resolver, Console, Controller, DuplicatePolicy, Shell};
//!
//! let project = registry::load_project(".".as_ref(), DuplicatePolicy::Reject).unwrap();
//! let services = resolver::resolve(&project, &["web".to_string()]).unwrap();
//!
//! let shell = Shell::default();
//! let mut console = Console::stdout(true);
//! let report = Controller::new(&shell, &mut console).up(&services).unwrap();
//! assert!(report.ok());
//! ```

pub mod config;
pub mod controller;
pub mod definition;
pub mod error;
pub mod executor;
pub mod logs;
pub mod output;
pub mod paths;
pub mod probe;
pub mod registry;
pub mod resolver;
pub mod types;

pub use config::{load_global_config, GlobalConfig};
pub use controller::{Controller, Report};
pub use error::{Error, ExecutionError, Result};
pub use executor::{LauncherScript, OutputMode, Shell};
pub use logs::LogMode;
pub use output::Console;
pub use paths::AppPaths;
pub use probe::{Liveness, Prober};
pub use registry::{DuplicatePolicy, ProjectBuilder};
pub use resolver::Resolver;
pub use types::*;
