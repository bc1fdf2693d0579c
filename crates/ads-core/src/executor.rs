use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use tempfile::NamedTempFile;

use crate::error::ExecutionError;

const LAUNCHER_PREFIX: &str = "ads_launcher_";

/// Where a script's stdout and stderr go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
	/// Inherit the terminal.
	#[default]
	Stream,
	/// Capture both streams into one buffer, in the order they were written.
	Buffer,
	/// Discard.
	Null,
}

/// A script written to a uniquely named temp file.
///
/// The file lives exactly as long as this value; dropping it removes the file.
pub struct LauncherScript {
	file: NamedTempFile,
}

impl LauncherScript {
	pub fn write(script: &str) -> std::io::Result<Self> {
		let mut file = tempfile::Builder::new().prefix(LAUNCHER_PREFIX).suffix(".sh").tempfile()?;
		file.write_all(script.as_bytes())?;
		file.flush()?;
		Ok(Self { file })
	}

	pub fn path(&self) -> &Path {
		self.file.path()
	}
}

/// Runs shell snippets through an interpreter, one at a time.
#[derive(Debug, Clone)]
pub struct Shell {
	program: PathBuf,
}

impl Default for Shell {
	fn default() -> Self {
		Self::new("/bin/bash")
	}
}

impl Shell {
	pub fn new(program: impl Into<PathBuf>) -> Self {
		Self { program: program.into() }
	}

	pub fn program(&self) -> &Path {
		&self.program
	}

	/// Runs `script` in `dir` with output streamed to the terminal.
	pub fn execute(&self, script: &str, dir: &Path) -> Result<(), ExecutionError> {
		self.run(script, dir, OutputMode::Stream).map(|_| ())
	}

	/// Runs `script` in `dir`, blocking until it exits.
	///
	/// Returns the captured output in [`OutputMode::Buffer`], `None` otherwise.
	pub fn run(&self, script: &str, dir: &Path, mode: OutputMode) -> Result<Option<Vec<u8>>, ExecutionError> {
		let launcher = LauncherScript::write(script).map_err(ExecutionError::Launcher)?;
		tracing::debug!("running {} in {}", launcher.path().display(), dir.display());
		tracing::trace!("script:\n{}", script);

		let mut capture = match mode {
			OutputMode::Buffer => Some(tempfile::tempfile().map_err(ExecutionError::Launcher)?),
			_ => None,
		};

		let mut cmd = Command::new(&self.program);
		cmd.arg(launcher.path()).current_dir(dir).stdin(Stdio::inherit());
		match (&capture, mode) {
			(Some(file), _) => {
				let out = file.try_clone().map_err(ExecutionError::Launcher)?;
				let err = file.try_clone().map_err(ExecutionError::Launcher)?;
				cmd.stdout(Stdio::from(out)).stderr(Stdio::from(err));
			}
			(None, OutputMode::Null) => {
				cmd.stdout(Stdio::null()).stderr(Stdio::null());
			}
			(None, _) => {
				cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
			}
		}

		let (status, interrupted) = {
			let guard = InterruptGuard::install();
			let mut child = cmd.spawn().map_err(|source| ExecutionError::Spawn {
				shell: self.program.clone(),
				source,
			})?;
			let status = child.wait().map_err(|source| ExecutionError::Spawn {
				shell: self.program.clone(),
				source,
			})?;
			(status, guard.interrupted())
		};

		let output = match capture.as_mut() {
			Some(file) => Some(read_back(file).map_err(ExecutionError::Launcher)?),
			None => None,
		};
		drop(launcher);

		if interrupted {
			tracing::debug!("interrupted while running {}", dir.display());
			return Err(ExecutionError::Interrupted);
		}
		classify(status, output)
	}
}

/// Runs `program` directly with `args`, attached to the terminal.
///
/// Used for interactive helpers such as the operator's editor, which must not
/// be wrapped in a launcher script.
pub fn run_program(program: &Path, args: &[PathBuf]) -> Result<(), ExecutionError> {
	tracing::debug!("running {} with {} argument(s)", program.display(), args.len());
	let guard = InterruptGuard::install();
	let status = Command::new(program)
		.args(args)
		.stdin(Stdio::inherit())
		.stdout(Stdio::inherit())
		.stderr(Stdio::inherit())
		.status()
		.map_err(|source| ExecutionError::Spawn {
			shell: program.to_path_buf(),
			source,
		})?;
	if guard.interrupted() {
		return Err(ExecutionError::Interrupted);
	}
	classify(status, None).map(|_| ())
}

fn classify(status: ExitStatus, output: Option<Vec<u8>>) -> Result<Option<Vec<u8>>, ExecutionError> {
	if status.success() {
		return Ok(output);
	}
	if let Some(code) = status.code() {
		tracing::debug!("script exited with status {}", code);
		return Err(ExecutionError::Exited { code, output });
	}
	match status.signal() {
		Some(signal) if signal == Signal::SIGINT as i32 => Err(ExecutionError::Interrupted),
		Some(signal) => Err(ExecutionError::Signaled { signal, output }),
		None => Err(ExecutionError::Exited { code: -1, output }),
	}
}

fn read_back(file: &mut File) -> std::io::Result<Vec<u8>> {
	let mut buf = Vec::new();
	file.seek(SeekFrom::Start(0))?;
	file.read_to_end(&mut buf)?;
	Ok(buf)
}

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Signal dispositions are process-wide; only one guard may be live at a time.
static GUARD_LOCK: Mutex<()> = Mutex::new(());

extern "C" fn note_interrupt(_: nix::libc::c_int) {
	INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Keeps SIGINT from killing this process while a child runs, and records
/// that it arrived.
///
/// The child shares our process group, so ctrl-c still reaches it. A handler
/// (rather than SIG_IGN) is installed because handlers reset to the default
/// across exec while an ignored disposition would be inherited. A child that
/// traps the signal and exits cleanly still counts as interrupted.
struct InterruptGuard {
	previous: Option<SigAction>,
	_lock: MutexGuard<'static, ()>,
}

impl InterruptGuard {
	fn install() -> Self {
		let lock = GUARD_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
		INTERRUPTED.store(false, Ordering::SeqCst);
		let action = SigAction::new(SigHandler::Handler(note_interrupt), SaFlags::SA_RESTART, SigSet::empty());
		// SAFETY: the handler only stores to an atomic, which is async-signal-safe.
		let previous = match unsafe { sigaction(Signal::SIGINT, &action) } {
			Ok(previous) => Some(previous),
			Err(e) => {
				tracing::warn!("could not install interrupt handler: {}", e);
				None
			}
		};
		Self { previous, _lock: lock }
	}

	fn interrupted(&self) -> bool {
		INTERRUPTED.load(Ordering::SeqCst)
	}
}

impl Drop for InterruptGuard {
	fn drop(&mut self) {
		if let Some(previous) = &self.previous {
			// SAFETY: restores the disposition returned by the matching install.
			let _ = unsafe { sigaction(Signal::SIGINT, previous) };
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sh() -> Shell {
		Shell::new("/bin/sh")
	}

	#[test]
	fn test_success_and_failure() {
		let dir = tempfile::tempdir().unwrap();
		assert!(sh().execute("exit 0", dir.path()).is_ok());
		match sh().execute("exit 3", dir.path()) {
			Err(ExecutionError::Exited { code, output }) => {
				assert_eq!(code, 3);
				assert!(output.is_none());
			}
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn test_runs_in_working_dir() {
		let dir = tempfile::tempdir().unwrap();
		sh().execute("pwd > where.txt", dir.path()).unwrap();
		let recorded = std::fs::read_to_string(dir.path().join("where.txt")).unwrap();
		assert_eq!(
			PathBuf::from(recorded.trim()).canonicalize().unwrap(),
			dir.path().canonicalize().unwrap()
		);
	}

	#[test]
	fn test_multiline_script_preserved() {
		let dir = tempfile::tempdir().unwrap();
		let script = "A='quoted $HOME'\nif [ -n \"$A\" ]; then\n  printf '%s' \"$A\" > out.txt\nfi\n";
		sh().execute(script, dir.path()).unwrap();
		let out = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
		assert_eq!(out, "quoted $HOME");
	}

	#[test]
	fn test_buffer_captures_interleaved_output() {
		let dir = tempfile::tempdir().unwrap();
		let out = sh()
			.run("echo one\necho two 1>&2\necho three", dir.path(), OutputMode::Buffer)
			.unwrap()
			.unwrap();
		assert_eq!(String::from_utf8_lossy(&out), "one\ntwo\nthree\n");

		let err = sh().run("echo broken; exit 1", dir.path(), OutputMode::Buffer).unwrap_err();
		assert_eq!(err.output(), Some(&b"broken\n"[..]));
	}

	#[test]
	fn test_null_discards_output() {
		let dir = tempfile::tempdir().unwrap();
		assert_eq!(sh().run("echo hidden", dir.path(), OutputMode::Null).unwrap(), None);
	}

	#[test]
	fn test_missing_shell_is_spawn_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = Shell::new("/nonexistent/shell").execute("exit 0", dir.path()).unwrap_err();
		assert!(matches!(err, ExecutionError::Spawn { .. }));
	}

	#[test]
	fn test_signal_is_reported() {
		let dir = tempfile::tempdir().unwrap();
		let err = sh().execute("kill -TERM $$", dir.path()).unwrap_err();
		assert!(matches!(err, ExecutionError::Signaled { signal: 15, .. }), "got {:?}", err);
	}

	#[test]
	fn test_sigint_exit_status_is_interrupt() {
		let status = ExitStatus::from_raw(Signal::SIGINT as i32);
		assert!(matches!(classify(status, None), Err(ExecutionError::Interrupted)));
		let status = ExitStatus::from_raw(Signal::SIGTERM as i32);
		assert!(matches!(classify(status, None), Err(ExecutionError::Signaled { signal: 15, .. })));
	}

	#[test]
	fn test_child_killed_by_sigint_is_interrupt() {
		let dir = tempfile::tempdir().unwrap();
		let err = sh().execute("kill -INT $$", dir.path()).unwrap_err();
		assert!(matches!(err, ExecutionError::Interrupted), "got {:?}", err);
	}

	#[test]
	fn test_interrupt_wins_over_clean_exit() {
		let dir = tempfile::tempdir().unwrap();
		let err = sh()
			.run("kill -INT $PPID; sleep 1; echo shutting down; exit 0", dir.path(), OutputMode::Buffer)
			.unwrap_err();
		assert!(matches!(err, ExecutionError::Interrupted), "got {:?}", err);

		// the flag does not leak into the next run
		assert!(sh().execute("exit 0", dir.path()).is_ok());
	}

	#[test]
	fn test_run_program_passes_args() {
		let dir = tempfile::tempdir().unwrap();
		let target = dir.path().join("made");
		run_program(Path::new("/usr/bin/env"), &[PathBuf::from("touch"), target.clone()]).unwrap();
		assert!(target.exists());

		let err = run_program(Path::new("/nonexistent/editor"), &[]).unwrap_err();
		assert!(matches!(err, ExecutionError::Spawn { .. }));
	}

	#[test]
	fn test_launcher_removed_on_drop() {
		let launcher = LauncherScript::write("echo hi").unwrap();
		let path = launcher.path().to_path_buf();
		assert!(path.exists());
		assert!(path.file_name().unwrap().to_string_lossy().starts_with(LAUNCHER_PREFIX));
		assert_eq!(std::fs::read_to_string(&path).unwrap(), "echo hi");
		drop(launcher);
		assert!(!path.exists());
	}

	#[test]
	fn test_launcher_removed_after_run() {
		let dir = tempfile::tempdir().unwrap();
		sh().execute("echo \"$0\" > launcher.txt", dir.path()).unwrap();
		let _ = sh().execute("echo \"$0\" > failed.txt; exit 1", dir.path());
		for name in ["launcher.txt", "failed.txt"] {
			let recorded = std::fs::read_to_string(dir.path().join(name)).unwrap();
			let launcher = PathBuf::from(recorded.trim());
			assert!(launcher.to_string_lossy().contains(LAUNCHER_PREFIX));
			assert!(!launcher.exists(), "{} still exists", launcher.display());
		}
	}
}
