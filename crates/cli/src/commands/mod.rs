mod cookies;
mod resolve;
mod state;

use crate::cli::{Commands, CookiesAction, StateAction};
use crate::context::CliContext;

pub async fn dispatch(command: Commands, ctx: &CliContext) -> anyhow::Result<()> {
	match command {
		Commands::Resolve(args) => resolve::run(ctx, args).await,
		Commands::State { action } => match action {
			StateAction::Show => state::show(ctx),
			StateAction::Reset => state::reset(ctx),
		},
		Commands::Cookies { action } => match action {
			CookiesAction::Show => cookies::show(ctx),
		},
	}
}
