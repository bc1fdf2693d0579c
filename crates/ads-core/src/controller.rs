use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, ExecutionError, Result};
use crate::executor::{self, OutputMode, Shell};
use crate::logs::{self, LogMode};
use crate::output::Console;
use crate::probe::{Liveness, Prober};
use crate::types::{LogKind, Service, Verb};

/// Services that did not reach their target state during one verb.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
	pub failed: Vec<String>,
}

impl Report {
	pub fn ok(&self) -> bool {
		self.failed.is_empty()
	}

	fn merge(mut self, other: Report) -> Report {
		for name in other.failed {
			if !self.failed.contains(&name) {
				self.failed.push(name);
			}
		}
		self
	}
}

/// Drives services toward a target state, one at a time.
///
/// A service that fails is reported and skipped; the rest of the batch still
/// runs. Only errors that make further work pointless (no launcher file,
/// operator interrupt) are returned.
pub struct Controller<'a, W: Write> {
	shell: &'a Shell,
	console: &'a mut Console<W>,
	quiet: bool,
}

impl<'a, W: Write> Controller<'a, W> {
	pub fn new(shell: &'a Shell, console: &'a mut Console<W>) -> Self {
		Self {
			shell,
			console,
			quiet: false,
		}
	}

	/// Silences probes and buffers start/stop output, showing it only on failure.
	pub fn quiet(mut self, quiet: bool) -> Self {
		self.quiet = quiet;
		self
	}

	pub fn up(&mut self, services: &[&Service]) -> Result<Report> {
		let mut report = Report::default();
		for svc in services {
			if !self.transition(svc, Verb::Start)? {
				report.failed.push(svc.name.clone());
			}
		}
		Ok(report)
	}

	pub fn down(&mut self, services: &[&Service]) -> Result<Report> {
		let mut report = Report::default();
		for svc in services {
			if !self.transition(svc, Verb::Stop)? {
				report.failed.push(svc.name.clone());
			}
		}
		Ok(report)
	}

	/// Stops then starts the same services.
	pub fn bounce(&mut self, services: &[&Service]) -> Result<Report> {
		let stopped = self.down(services)?;
		let started = self.up(services)?;
		Ok(stopped.merge(started))
	}

	/// Reports each service's state; the report lists the ones not running.
	pub fn status(&mut self, services: &[&Service]) -> Result<Report> {
		let mut report = Report::default();
		for svc in services {
			let liveness = self.prober().probe(svc)?;
			let running = match liveness {
				Liveness::Running => Some(true),
				Liveness::Stopped => Some(false),
				Liveness::Undefined => None,
			};
			self.console.status(&svc.name, running);
			if running != Some(true) {
				report.failed.push(svc.name.clone());
			}
		}
		Ok(report)
	}

	pub fn logs(&mut self, services: &[&Service], kind: LogKind, mode: LogMode, cwd: &Path) -> Result<()> {
		let paths = logs::collect_log_paths(services, kind);
		if paths.is_empty() {
			let names: Vec<&str> = services.iter().map(|s| s.name.as_str()).collect();
			return Err(Error::NoLogs {
				kind: kind.label(),
				services: format!("[{}]", names.join(", ")),
			});
		}

		match mode {
			LogMode::List => {
				for path in &paths {
					self.console.plain(&path.display().to_string());
				}
				Ok(())
			}
			LogMode::Cat => match self.shell.run(&logs::cat_command(&paths), cwd, OutputMode::Stream) {
				Ok(_) => Ok(()),
				Err(e) => Err(Error::Command {
					command: "cat",
					source: e.into_fatal()?,
				}),
			},
			LogMode::Tail => match self.shell.run(&logs::tail_command(&paths), cwd, OutputMode::Stream) {
				Ok(_) | Err(ExecutionError::Interrupted) => Ok(()),
				Err(e) => Err(Error::Command {
					command: "tail",
					source: e.into_fatal()?,
				}),
			},
		}
	}

	/// Prints each service's home directory.
	pub fn home(&mut self, services: &[&Service]) {
		for svc in services {
			self.console.plain(&svc.home.display().to_string());
		}
	}

	/// Opens the services' definition files in `editor`.
	pub fn edit(&mut self, services: &[&Service], editor: &Path) -> Result<()> {
		let files: Vec<PathBuf> = services.iter().map(|s| s.definition_path()).collect();
		executor::run_program(editor, &files).or_else(|e| {
			Err(Error::Command {
				command: "editor",
				source: e.into_fatal()?,
			})
		})
	}

	fn prober(&self) -> Prober<'a> {
		let mode = if self.quiet { OutputMode::Null } else { OutputMode::Stream };
		Prober::new(self.shell, mode)
	}

	/// Moves one service toward running (`Start`) or stopped (`Stop`).
	///
	/// Returns whether the service ended up where it should be, as far as
	/// this run could tell.
	fn transition(&mut self, svc: &Service, verb: Verb) -> Result<bool> {
		let (want_running, present, gerund, past) = match verb {
			Verb::Start => (true, "running", "Starting", "start"),
			_ => (false, "stopped", "Stopping", "stop"),
		};

		match self.prober().probe(svc)? {
			Liveness::Undefined => {
				self.console.failure(&format!(
					"Status command not defined for {}; can't tell if it's already {}",
					svc.name, present
				));
				return Ok(false);
			}
			Liveness::Running if want_running => {
				self.console.info(&format!("{} is already running", svc.name));
				return Ok(true);
			}
			Liveness::Stopped if !want_running => {
				self.console.info(&format!("{} is already stopped", svc.name));
				return Ok(true);
			}
			_ => {}
		}

		let Some(cmd) = svc.command(verb) else {
			let label = if want_running { "Start" } else { "Stop" };
			self.console.failure(&format!("{} command not defined for {}", label, svc.name));
			return Ok(false);
		};

		self.console.info(&format!("{} {}", gerund, svc.name));
		let mode = if self.quiet { OutputMode::Buffer } else { OutputMode::Stream };
		match self.shell.run(cmd, &svc.home, mode) {
			Ok(_) => {
				tracing::debug!("{} command for {} succeeded", past, svc.name);
				Ok(true)
			}
			Err(e) => {
				let e = e.into_fatal()?;
				tracing::debug!("{} command for {}: {}", past, svc.name, e);
				self.console.failure(&format!("Failed to {} {}", past, svc.name));
				if let Some(output) = e.output() {
					self.console.replay(output);
				}
				Ok(false)
			}
		}
	}
}
