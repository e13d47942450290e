//! Inputs and outputs of the launch resolver.

use std::fmt;
use std::time::Duration;

use launchgate_protocol::{AttributionPayload, ConfigRequest, ConfigResult};
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::error::ConfigFailure;

/// The presentation mode the client should show.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "mode", content = "url", rename_all = "snake_case")]
pub enum LaunchDecision {
	#[default]
	Loading,
	ContentSession(Url),
	Fallback,
	Offline,
}

impl LaunchDecision {
	pub fn content_url(&self) -> Option<&Url> {
		match self {
			LaunchDecision::ContentSession(url) => Some(url),
			_ => None,
		}
	}
}

impl fmt::Display for LaunchDecision {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LaunchDecision::Loading => write!(f, "loading"),
			LaunchDecision::ContentSession(url) => write!(f, "content_session({})", url),
			LaunchDecision::Fallback => write!(f, "fallback"),
			LaunchDecision::Offline => write!(f, "offline"),
		}
	}
}

/// How the notification-permission prompt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
	Granted,
	/// The system-level permission was refused.
	Denied,
	/// The user dismissed the in-app prompt without deciding.
	Skipped,
}

/// Messages delivered to the resolver on the control task.
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchEvent {
	Start,
	Reachability {
		online: bool,
	},
	Attribution(AttributionPayload),
	/// The attribution SDK gave up; resolution continues with an empty payload.
	AttributionFailed {
		device_id: String,
		reason: String,
	},
	EnrichmentFinished {
		attempt: u64,
		fields: Option<Map<String, Value>>,
	},
	NotificationPromptFinished(PermissionOutcome),
	ConfigFinished {
		attempt: u64,
		result: std::result::Result<ConfigResult, ConfigFailure>,
	},
	/// Raw push or deep-link payload.
	PushPayload(Value),
	DeepLinkDue,
}

/// Work the resolver asks its driver to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
	Present(LaunchDecision),
	FetchEnrichment {
		attempt: u64,
		device_id: String,
	},
	FetchConfig {
		attempt: u64,
		request: ConfigRequest,
	},
	PromptNotifications,
	ScheduleDeepLink {
		delay: Duration,
	},
}
