//! Runtime configuration for launch resolution and navigation.
//!
//! Loaded from a camelCase JSON file. Every field has a default so partial
//! files are accepted; a missing file yields [`LaunchConfig::default`].

use std::fs;
use std::path::Path;
use std::time::Duration;

use launchgate_protocol::PLATFORM_IOS;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{LaunchError, Result};

const DEFAULT_CONFIG_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ENRICHMENT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DEEP_LINK_DELAY_MS: u64 = 1000;
const DEFAULT_NOTIFICATION_REPROMPT_HOURS: u64 = 72;
const DEFAULT_REDIRECT_CEILING: u32 = 20;
const DEFAULT_LOCALE: &str = "en";

/// How server-trust authentication challenges are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrustPolicy {
	/// Accept whatever trust the server presents. No certificate validation.
	#[default]
	AcceptPresented,
	/// Defer every challenge to the platform's default handling.
	PlatformDefault,
}

/// Navigation session tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationConfig {
	/// Consecutive server redirects tolerated before the guard trips.
	pub redirect_ceiling: u32,
	pub trust_policy: TrustPolicy,
}

impl Default for NavigationConfig {
	fn default() -> Self {
		Self {
			redirect_ceiling: DEFAULT_REDIRECT_CEILING,
			trust_policy: TrustPolicy::default(),
		}
	}
}

/// Identity, endpoints, and timing used by a launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LaunchConfig {
	/// Full address of the config endpoint (`https://<host>/config.php`).
	pub config_endpoint: Option<Url>,
	/// Base address of the attribution server used for organic-install enrichment.
	pub attribution_endpoint: Option<Url>,
	pub store_id: String,
	pub dev_key: String,
	pub bundle_id: String,
	pub firebase_project_id: String,
	/// Overrides the locale reported by the host.
	pub locale: Option<String>,
	pub platform: String,
	pub config_timeout_secs: u64,
	pub enrichment_timeout_secs: u64,
	pub deep_link_delay_ms: u64,
	pub notification_reprompt_hours: u64,
	pub navigation: NavigationConfig,
}

impl Default for LaunchConfig {
	fn default() -> Self {
		Self {
			config_endpoint: None,
			attribution_endpoint: None,
			store_id: String::new(),
			dev_key: String::new(),
			bundle_id: String::new(),
			firebase_project_id: String::new(),
			locale: None,
			platform: PLATFORM_IOS.to_string(),
			config_timeout_secs: DEFAULT_CONFIG_TIMEOUT_SECS,
			enrichment_timeout_secs: DEFAULT_ENRICHMENT_TIMEOUT_SECS,
			deep_link_delay_ms: DEFAULT_DEEP_LINK_DELAY_MS,
			notification_reprompt_hours: DEFAULT_NOTIFICATION_REPROMPT_HOURS,
			navigation: NavigationConfig::default(),
		}
	}
}

impl LaunchConfig {
	/// Loads configuration from `path`. A missing file yields defaults; a
	/// malformed one is an error.
	pub fn load(path: &Path) -> Result<Self> {
		match fs::read_to_string(path) {
			Ok(content) => Self::from_json(&content),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
			Err(err) => Err(err.into()),
		}
	}

	pub fn from_json(content: &str) -> Result<Self> {
		serde_json::from_str(content).map_err(|e| LaunchError::Config(format!("invalid launch config: {}", e)))
	}

	pub fn locale_or_default(&self) -> &str {
		self.locale.as_deref().unwrap_or(DEFAULT_LOCALE)
	}

	pub fn config_timeout(&self) -> Duration {
		Duration::from_secs(self.config_timeout_secs)
	}

	pub fn enrichment_timeout(&self) -> Duration {
		Duration::from_secs(self.enrichment_timeout_secs)
	}

	pub fn deep_link_delay(&self) -> Duration {
		Duration::from_millis(self.deep_link_delay_ms)
	}

	pub fn notification_reprompt_secs(&self) -> i64 {
		(self.notification_reprompt_hours as i64).saturating_mul(3600)
	}
}
