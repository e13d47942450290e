//! Error types for settings persistence, configuration, and surfaces.

use thiserror::Error;

/// Errors surfaced by the `launchgate` core.
///
/// Nothing in launch resolution is fatal; these errors are logged and mapped
/// to a fallback path by callers.
#[derive(Debug, Error)]
pub enum LaunchError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Configuration error: {0}")]
	Config(String),

	#[error("Persistence error: {0}")]
	Persistence(String),

	#[error("Surface error: {0}")]
	Surface(String),
}

/// Why a remote config call did not yield a usable answer.
///
/// All variants share one recovery path: cached content URL, else fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigFailure {
	#[error("config request could not be built: {0}")]
	Request(String),

	#[error("config transport failed: {0}")]
	Transport(String),

	#[error("config endpoint returned status {0}")]
	Status(u16),

	#[error("config response could not be decoded: {0}")]
	Decode(String),
}

pub type Result<T> = std::result::Result<T, LaunchError>;
