use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures that abort a whole command.
#[derive(Debug, Error)]
pub enum Error {
	#[error("could not determine working directory: {0}")]
	WorkingDir(#[source] io::Error),

	#[error("failed to read {}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("failed to walk {}: {source}", .root.display())]
	Walk {
		root: PathBuf,
		#[source]
		source: walkdir::Error,
	},

	#[error("{}: {message}", .path.display())]
	Parse { path: PathBuf, message: String },

	#[error("service '{name}' is defined twice: {} and {}", .first.display(), .second.display())]
	DuplicateService {
		name: String,
		first: PathBuf,
		second: PathBuf,
	},

	#[error("no service or selector named '{name}'. Reference chain: {}", .chain.join(" -> "))]
	UnknownService { name: String, chain: Vec<String> },

	#[error("definition of selector '{}' is circular: {}", .chain[0], .chain.join(" -> "))]
	CircularSelector { chain: Vec<String> },

	#[error("no services found that match '{0}'")]
	NoMatch(String),

	#[error("no {kind} log files found for services {services}")]
	NoLogs { kind: &'static str, services: String },

	#[error("failed to create launcher script: {0}")]
	Launcher(#[source] io::Error),

	/// A helper program run on the operator's behalf (cat, tail, the editor).
	#[error("{command} failed: {source}")]
	Command {
		command: &'static str,
		#[source]
		source: ExecutionError,
	},

	#[error("failed to encode {format}: {message}")]
	Encode { format: &'static str, message: String },

	#[error("interrupted")]
	Interrupted,
}

impl Error {
	/// True for errors caused by a selector the project cannot satisfy.
	pub fn is_not_found(&self) -> bool {
		matches!(
			self,
			Error::UnknownService { .. } | Error::CircularSelector { .. } | Error::NoMatch(_) | Error::NoLogs { .. }
		)
	}
}

/// Outcome of a single shell run that did not succeed.
#[derive(Debug, Error)]
pub enum ExecutionError {
	#[error("could not write launcher script: {0}")]
	Launcher(#[source] io::Error),

	#[error("could not spawn {}: {source}", .shell.display())]
	Spawn {
		shell: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("exited with status {code}")]
	Exited { code: i32, output: Option<Vec<u8>> },

	#[error("killed by signal {signal}")]
	Signaled { signal: i32, output: Option<Vec<u8>> },

	#[error("interrupted")]
	Interrupted,
}

impl ExecutionError {
	/// Output captured in buffer mode, if any.
	pub fn output(&self) -> Option<&[u8]> {
		match self {
			ExecutionError::Exited { output, .. } | ExecutionError::Signaled { output, .. } => output.as_deref(),
			_ => None,
		}
	}

	/// Escalates the failures that must stop the whole command.
	///
	/// A launcher that cannot be written means the temp directory is unusable,
	/// and an interrupt means the operator asked to stop; both end the batch.
	pub fn into_fatal(self) -> std::result::Result<ExecutionError, Error> {
		match self {
			ExecutionError::Launcher(e) => Err(Error::Launcher(e)),
			ExecutionError::Interrupted => Err(Error::Interrupted),
			other => Ok(other),
		}
	}
}
