mod listing;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use ads_core::definition::load_profile;
use ads_core::logs::LogMode;
use ads_core::{
	load_global_config, registry, AppPaths, Console, Controller, Error, LogKind, Report, Resolver, Service, Shell,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing::Level;

const EXIT_NOT_FOUND: u8 = 11;
const EXIT_INTERNAL: u8 = 50;
const EXIT_INTERRUPTED: u8 = 130;

/// Start, stop, and manage the services in a codebase.
#[derive(Debug, Parser)]
#[command(name = "ads", version, arg_required_else_help = true)]
struct Cli {
	/// More diagnostics on stderr (-v debug, -vv trace)
	#[arg(short, long, action = ArgAction::Count, global = true)]
	verbose: u8,

	/// Hide probe output; show start/stop output only when they fail
	#[arg(short, long, global = true)]
	quiet: bool,

	#[command(subcommand)]
	command: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
	/// Print the available services and groups
	List,
	/// Start services
	#[command(visible_aliases = ["start", "run"])]
	Up(Targets),
	/// Stop services
	#[command(visible_aliases = ["stop", "kill"])]
	Down(Targets),
	/// Stop then start services
	#[command(visible_alias = "restart")]
	Bounce(Targets),
	/// Print whether services are running
	Status(Targets),
	/// Show the log files of services
	Logs(LogsArgs),
	/// Print the definitions of services
	Dump {
		/// Emit JSON instead of YAML
		#[arg(long)]
		json: bool,
		#[command(flatten)]
		targets: Targets,
	},
	/// Print the home directories of services
	Home(Targets),
	/// Open the ads.yml of services in $EDITOR
	Edit(Targets),
}

#[derive(Debug, Args)]
struct Targets {
	/// Services, groups, `all` or `default` (the default when none are given)
	services: Vec<String>,
}

#[derive(Debug, Args)]
struct LogsArgs {
	/// Print current contents
	#[arg(long, conflicts_with_all = ["tail", "list"])]
	cat: bool,
	/// Follow appended output (the default)
	#[arg(long, conflicts_with = "list")]
	tail: bool,
	/// Print the matching log paths
	#[arg(long)]
	list: bool,
	/// Use error logs
	#[arg(long, conflicts_with = "general")]
	errors: bool,
	/// Use general logs (the default)
	#[arg(long)]
	general: bool,
	#[command(flatten)]
	targets: Targets,
}

impl LogsArgs {
	fn mode(&self) -> LogMode {
		if self.cat {
			LogMode::Cat
		} else if self.list {
			LogMode::List
		} else {
			LogMode::Tail
		}
	}

	fn kind(&self) -> LogKind {
		if self.errors {
			LogKind::Error
		} else {
			LogKind::General
		}
	}
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	match run(&cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("{} {}", "error:".red().bold(), e);
			ExitCode::from(exit_code(&e))
		}
	}
}

fn init_tracing(verbose: u8) {
	let level = match verbose {
		0 => Level::WARN,
		1 => Level::DEBUG,
		_ => Level::TRACE,
	};
	tracing_subscriber::fmt()
		.with_max_level(level)
		.with_writer(std::io::stderr)
		.with_target(false)
		.without_time()
		.init();
}

fn exit_code(err: &Error) -> u8 {
	if err.is_not_found() {
		EXIT_NOT_FOUND
	} else if matches!(err, Error::Interrupted) {
		EXIT_INTERRUPTED
	} else {
		EXIT_INTERNAL
	}
}

fn run(cli: &Cli) -> ads_core::Result<()> {
	let config = load_global_config();
	let cwd = std::env::current_dir().map_err(Error::WorkingDir)?;
	let project = registry::load_project(&cwd, config.registry.on_duplicate)?;
	let profile = load_profile(&AppPaths::default().profile_path())?;
	let resolver = Resolver::new(&project, &profile);

	let shell = Shell::new(config.shell.program.clone());
	let color = config.output.color && std::io::stdout().is_terminal();
	let quiet = cli.quiet || config.output.quiet;
	let mut console = Console::stdout(color);
	let mut ctl = Controller::new(&shell, &mut console).quiet(quiet);

	match &cli.command {
		Action::List => {
			print!("{}", listing::project_listing(&project, &profile, &resolver).render(color));
		}
		Action::Up(t) => summarize("up", ctl.up(&resolver.resolve_nonempty(&t.services)?)?),
		Action::Down(t) => summarize("down", ctl.down(&resolver.resolve_nonempty(&t.services)?)?),
		Action::Bounce(t) => summarize("bounce", ctl.bounce(&resolver.resolve_nonempty(&t.services)?)?),
		Action::Status(t) => summarize("status", ctl.status(&resolver.resolve(&t.services)?)?),
		Action::Logs(args) => {
			let services = resolver.resolve(&args.targets.services)?;
			ctl.logs(&services, args.kind(), args.mode(), &cwd)?;
		}
		Action::Dump { json, targets } => {
			print!("{}", dump(&resolver.resolve(&targets.services)?, *json)?);
		}
		Action::Home(t) => ctl.home(&resolver.resolve_nonempty(&t.services)?),
		Action::Edit(t) => ctl.edit(&resolver.resolve_nonempty(&t.services)?, &editor())?,
	}
	Ok(())
}

/// Per-service failures were already printed; they do not change the exit code.
fn summarize(verb: &str, report: Report) {
	if !report.ok() {
		tracing::debug!("{}: not in target state: {}", verb, report.failed.join(", "));
	}
}

fn dump(services: &[&Service], json: bool) -> ads_core::Result<String> {
	if json {
		let mut text = serde_json::to_string_pretty(services).map_err(|e| Error::Encode {
			format: "json",
			message: e.to_string(),
		})?;
		text.push('\n');
		Ok(text)
	} else {
		serde_yaml::to_string(services).map_err(|e| Error::Encode {
			format: "yaml",
			message: e.to_string(),
		})
	}
}

fn editor() -> PathBuf {
	match std::env::var("EDITOR") {
		Ok(editor) if !editor.trim().is_empty() => PathBuf::from(editor),
		_ => PathBuf::from("vi"),
	}
}
