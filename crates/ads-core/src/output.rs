use std::io::{self, Write};

use owo_colors::OwoColorize;

/// Line-oriented operator output for the lifecycle verbs.
///
/// Every line is flushed immediately so it lands before any child output that
/// follows it on the same terminal.
pub struct Console<W: Write> {
	out: W,
	color: bool,
}

impl Console<io::Stdout> {
	pub fn stdout(color: bool) -> Self {
		Self::new(io::stdout(), color)
	}
}

impl<W: Write> Console<W> {
	pub fn new(out: W, color: bool) -> Self {
		Self { out, color }
	}

	pub fn info(&mut self, msg: &str) {
		if self.color {
			self.line(&msg.green().to_string());
		} else {
			self.line(msg);
		}
	}

	pub fn failure(&mut self, msg: &str) {
		if self.color {
			self.line(&msg.red().to_string());
		} else {
			self.line(msg);
		}
	}

	pub fn status(&mut self, name: &str, running: Option<bool>) {
		let line = match (running, self.color) {
			(Some(true), true) => format!("{}: {}", name.bold(), "ok".green()),
			(Some(true), false) => format!("{}: ok", name),
			(Some(false), true) => format!("{}: {}", name.bold(), "stopped".red()),
			(Some(false), false) => format!("{}: stopped", name),
			(None, true) => format!("{}: {}", name.bold(), "status command not defined".yellow()),
			(None, false) => format!("{}: status command not defined", name),
		};
		self.line(&line);
	}

	pub fn plain(&mut self, msg: &str) {
		self.line(msg);
	}

	/// Replays output captured from a failed script.
	pub fn replay(&mut self, output: &[u8]) {
		let _ = self.out.write_all(output);
		if !output.is_empty() && !output.ends_with(b"\n") {
			let _ = self.out.write_all(b"\n");
		}
		if self.color {
			self.line(&"--------------------------------".dimmed().to_string());
		} else {
			self.line("--------------------------------");
		}
	}

	pub fn into_inner(self) -> W {
		self.out
	}

	fn line(&mut self, text: &str) {
		let _ = writeln!(self.out, "{}", text);
		let _ = self.out.flush();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn text(console: Console<Vec<u8>>) -> String {
		String::from_utf8(console.into_inner()).unwrap()
	}

	#[test]
	fn test_plain_lines() {
		let mut console = Console::new(Vec::new(), false);
		console.info("Starting web");
		console.status("web", Some(true));
		console.status("db", Some(false));
		console.status("job", None);
		assert_eq!(text(console), "Starting web\nweb: ok\ndb: stopped\njob: status command not defined\n");
	}

	#[test]
	fn test_colored_lines_keep_text() {
		let mut console = Console::new(Vec::new(), true);
		console.failure("Failed to start web");
		let out = text(console);
		assert!(out.contains("\u{1b}["));
		assert!(out.contains("Failed to start web"));
	}

	#[test]
	fn test_replay_terminates_line() {
		let mut console = Console::new(Vec::new(), false);
		console.replay(b"boom");
		assert_eq!(text(console), "boom\n--------------------------------\n");
	}
}
