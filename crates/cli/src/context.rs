//! Resolved file locations and shared handles for one CLI invocation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use launchgate::{FileStore, LaunchConfig, LaunchSettings};

use crate::output::OutputFormat;

const APP_DIR: &str = "launchgate";

pub struct CliContext {
	state_path: PathBuf,
	config_path: PathBuf,
	pub format: OutputFormat,
}

impl CliContext {
	pub fn new(state: Option<PathBuf>, config: Option<PathBuf>, format: OutputFormat) -> Self {
		Self {
			state_path: state.unwrap_or_else(default_state_path),
			config_path: config.unwrap_or_else(default_config_path),
			format,
		}
	}

	pub fn state_path(&self) -> &Path {
		&self.state_path
	}

	pub fn config_path(&self) -> &Path {
		&self.config_path
	}

	pub fn settings(&self) -> LaunchSettings {
		LaunchSettings::new(Arc::new(FileStore::load(&self.state_path)))
	}

	pub fn launch_config(&self) -> launchgate::Result<LaunchConfig> {
		LaunchConfig::load(&self.config_path)
	}
}

fn default_state_path() -> PathBuf {
	dirs::data_dir()
		.unwrap_or_else(|| PathBuf::from("."))
		.join(APP_DIR)
		.join("state.json")
}

fn default_config_path() -> PathBuf {
	dirs::config_dir()
		.unwrap_or_else(|| PathBuf::from("."))
		.join(APP_DIR)
		.join("config.json")
}
