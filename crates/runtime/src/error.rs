//! Error types for the async runtime and HTTP collaborators.

use launchgate::LaunchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
	#[error(transparent)]
	Launch(#[from] LaunchError),

	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	#[error("Response decode error: {0}")]
	Decode(String),

	#[error("{0} is not configured")]
	NotConfigured(&'static str),

	#[error("Launch runtime channel closed")]
	ChannelClosed,
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
