use clap::Parser;
use launchgate_cli::cli::Cli;
use launchgate_cli::context::CliContext;
use launchgate_cli::{commands, logging};
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let ctx = CliContext::new(cli.state, cli.config, cli.format);
	if let Err(err) = commands::dispatch(cli.command, &ctx).await {
		error!(target: "launchgate", error = %err, "command failed");
		eprintln!("error: {err:#}");
		std::process::exit(1);
	}
}
