use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use launchgate::PermissionOutcome;

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "launchgate")]
#[command(about = "Inspect launch state and run headless launch resolution")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Persisted state file (defaults to the platform data directory)
	#[arg(long, global = true, value_name = "FILE")]
	pub state: Option<PathBuf>,

	/// Launch config file (defaults to the platform config directory)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Output format
	#[arg(short, long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Run one resolution against the state file and print the decision
	Resolve(ResolveArgs),

	/// Inspect or clear persisted launch state
	State {
		#[command(subcommand)]
		action: StateAction,
	},

	/// Inspect the persisted cookie snapshot
	Cookies {
		#[command(subcommand)]
		action: CookiesAction,
	},
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
	/// Attribution payload as a JSON object (omit to simulate an attribution failure)
	#[arg(long, value_name = "JSON")]
	pub attribution: Option<String>,

	/// Device identifier reported with the attribution payload
	#[arg(long, default_value = "cli-device")]
	pub device_id: String,

	/// Simulate missing connectivity from the start
	#[arg(long)]
	pub offline: bool,

	/// Answer given to the notification-permission prompt
	#[arg(long, value_enum, default_value = "skipped")]
	pub notifications: NotificationAnswer,

	/// Push token to store before resolving
	#[arg(long)]
	pub push_token: Option<String>,

	/// Deliver a deep link before resolution starts
	#[arg(long, value_name = "URL")]
	pub deep_link: Option<String>,

	/// Give up after this many seconds
	#[arg(long, default_value = "60")]
	pub timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum NotificationAnswer {
	Granted,
	Denied,
	Skipped,
}

impl From<NotificationAnswer> for PermissionOutcome {
	fn from(answer: NotificationAnswer) -> Self {
		match answer {
			NotificationAnswer::Granted => PermissionOutcome::Granted,
			NotificationAnswer::Denied => PermissionOutcome::Denied,
			NotificationAnswer::Skipped => PermissionOutcome::Skipped,
		}
	}
}

#[derive(Subcommand, Debug)]
pub enum StateAction {
	/// Print the persisted launch state
	Show,
	/// Remove every persisted launch key
	Reset,
}

#[derive(Subcommand, Debug)]
pub enum CookiesAction {
	/// Print the stored cookie snapshot
	Show,
}
