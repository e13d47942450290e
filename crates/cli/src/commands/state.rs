use serde_json::json;
use tracing::info;

use crate::context::CliContext;
use crate::output::emit;

pub fn show(ctx: &CliContext) -> anyhow::Result<()> {
	let state = ctx.settings().snapshot();
	emit(ctx.format, &state, || {
		let url = state.saved_content_url.as_ref().map_or("-".to_string(), |url| url.to_string());
		format!(
			"mode: {}\nlaunched before: {}\nsaved url: {}\nsaved expiry: {}",
			state.app_mode.as_str(),
			state.has_launched_before,
			url,
			state.saved_expiry.map_or("-".to_string(), |at| at.to_string()),
		)
	})
}

pub fn reset(ctx: &CliContext) -> anyhow::Result<()> {
	ctx.settings().clear();
	info!(target: "launchgate", path = %ctx.state_path().display(), "launch state cleared");
	let path = ctx.state_path().display().to_string();
	emit(ctx.format, &json!({ "reset": true, "path": path }), || format!("cleared {path}"))
}
