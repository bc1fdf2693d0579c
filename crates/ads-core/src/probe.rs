use crate::error::Result;
use crate::executor::{OutputMode, Shell};
use crate::types::{Service, Verb};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
	Running,
	Stopped,
	/// The service declares no status command.
	Undefined,
}

/// Infers whether a service is up by running its `status_cmd`.
///
/// Exit status 0 means running. Anything else, including a probe that could
/// not be started at all, means stopped. Only a failure to write the launcher
/// or an operator interrupt is returned as an error.
pub struct Prober<'a> {
	shell: &'a Shell,
	mode: OutputMode,
}

impl<'a> Prober<'a> {
	pub fn new(shell: &'a Shell, mode: OutputMode) -> Self {
		Self { shell, mode }
	}

	pub fn probe(&self, service: &Service) -> Result<Liveness> {
		let Some(cmd) = service.command(Verb::Status) else {
			return Ok(Liveness::Undefined);
		};
		tracing::debug!("checking if {} is running", service.name);
		match self.shell.run(cmd, &service.home, self.mode) {
			Ok(_) => Ok(Liveness::Running),
			Err(e) => {
				let e = e.into_fatal()?;
				tracing::debug!("{} probe: {}", service.name, e);
				Ok(Liveness::Stopped)
			}
		}
	}

	pub fn is_running(&self, service: &Service) -> Result<bool> {
		Ok(self.probe(service)? == Liveness::Running)
	}
}
