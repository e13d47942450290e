use serde_json::{Value, json};

use crate::context::CliContext;
use crate::output::emit;

pub fn show(ctx: &CliContext) -> anyhow::Result<()> {
	let snapshot = ctx.settings().stored_cookies().unwrap_or_else(|| json!({}));
	emit(ctx.format, &snapshot, || render_text(&snapshot))
}

fn render_text(snapshot: &Value) -> String {
	let Some(domains) = snapshot.as_object().filter(|domains| !domains.is_empty()) else {
		return "no stored cookies".to_string();
	};
	let mut lines = Vec::new();
	for (domain, cookies) in domains {
		let names: Vec<&str> = cookies
			.as_object()
			.map(|cookies| cookies.keys().map(String::as_str).collect())
			.unwrap_or_default();
		lines.push(format!("{domain}: {}", names.join(", ")));
	}
	lines.join("\n")
}
