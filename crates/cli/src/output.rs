use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

/// Output format for command results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Pretty-printed JSON (default)
	#[default]
	Json,
	/// Single-line JSON
	Compact,
	/// Human-readable text
	Text,
}

impl fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OutputFormat::Json => write!(f, "json"),
			OutputFormat::Compact => write!(f, "compact"),
			OutputFormat::Text => write!(f, "text"),
		}
	}
}

/// Writes `data` to stdout. `text` renders the human form.
pub fn emit<T: Serialize>(format: OutputFormat, data: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
	let rendered = match format {
		OutputFormat::Json => serde_json::to_string_pretty(data)?,
		OutputFormat::Compact => serde_json::to_string(data)?,
		OutputFormat::Text => text(),
	};
	println!("{rendered}");
	Ok(())
}
