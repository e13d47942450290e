//! Typed access to the persisted launch settings.
//!
//! Every durable flag the resolver, the deep-link path, and the cookie
//! adapter touch goes through [`LaunchSettings`]. Values that fail to decode
//! read as absent; write failures are logged and otherwise ignored so a broken
//! disk never blocks a launch.

use std::sync::Arc;

use launchgate_protocol::CookieSnapshot;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use url::Url;

mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Persisted key names.
pub mod keys {
	pub const HAS_LAUNCHED: &str = "hasLaunched";
	pub const APP_MODE: &str = "app_mode";
	pub const SAVED_URL: &str = "saved_url";
	pub const SAVED_EXPIRES: &str = "saved_expires";
	pub const ACCEPTED_NOTIFICATIONS: &str = "accepted_notifications";
	pub const SYSTEM_CLOSE_NOTIFICATIONS: &str = "system_close_notifications";
	pub const LAST_NOTIFICATION_ASK: &str = "last_notification_ask";
	pub const STORED_COOKIES: &str = "stored_cookies";
	pub const TEMP_URL: &str = "temp_url";
	pub const FCM_TOKEN: &str = "fcm_token";
}

/// Durable presentation mode chosen by a prior resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppMode {
	#[default]
	Unset,
	ContentSession,
	Fallback,
}

impl AppMode {
	pub fn as_str(self) -> &'static str {
		match self {
			AppMode::Unset => "unset",
			AppMode::ContentSession => "content_session",
			AppMode::Fallback => "fallback",
		}
	}

	/// Unknown strings decode as [`AppMode::Unset`].
	pub fn from_stored(value: &str) -> Self {
		match value {
			"content_session" => AppMode::ContentSession,
			"fallback" => AppMode::Fallback,
			_ => AppMode::Unset,
		}
	}
}

/// Read-only view of everything the resolver persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLaunchState {
	pub has_launched_before: bool,
	pub app_mode: AppMode,
	pub saved_content_url: Option<Url>,
	pub saved_expiry: Option<i64>,
	pub notifications_accepted: Option<bool>,
	pub system_notifications_denied: bool,
	pub last_notification_prompt_at: Option<i64>,
	pub pending_deep_link: Option<Url>,
	pub push_token: Option<String>,
}

/// Typed facade over a [`KeyValueStore`].
#[derive(Clone)]
pub struct LaunchSettings {
	store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for LaunchSettings {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LaunchSettings").field("state", &self.snapshot()).finish()
	}
}

impl LaunchSettings {
	pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
		Self { store }
	}

	pub fn in_memory() -> Self {
		Self::new(Arc::new(MemoryStore::new()))
	}

	pub fn store(&self) -> &Arc<dyn KeyValueStore> {
		&self.store
	}

	pub fn has_launched(&self) -> bool {
		self.bool(keys::HAS_LAUNCHED).unwrap_or(false)
	}

	pub fn set_has_launched(&self, launched: bool) {
		self.write(keys::HAS_LAUNCHED, Value::Bool(launched));
	}

	pub fn app_mode(&self) -> AppMode {
		self.store
			.get(keys::APP_MODE)
			.and_then(|value| value.as_str().map(AppMode::from_stored))
			.unwrap_or_default()
	}

	pub fn set_app_mode(&self, mode: AppMode) {
		self.write(keys::APP_MODE, Value::String(mode.as_str().to_string()));
	}

	pub fn saved_url(&self) -> Option<Url> {
		self.url(keys::SAVED_URL)
	}

	pub fn saved_expiry(&self) -> Option<i64> {
		self.timestamp(keys::SAVED_EXPIRES)
	}

	/// Persists an approved content address and its expiry.
	pub fn save_content(&self, url: &Url, expires_at: Option<i64>) {
		self.write(keys::SAVED_URL, Value::String(url.to_string()));
		match expires_at {
			Some(expires) => self.write(keys::SAVED_EXPIRES, Value::from(expires)),
			None => self.erase(keys::SAVED_EXPIRES),
		}
	}

	/// Saved content address whose expiry lies strictly after `now`.
	pub fn unexpired_content(&self, now: i64) -> Option<Url> {
		let expires = self.saved_expiry()?;
		if expires <= now {
			return None;
		}
		self.saved_url()
	}

	pub fn notifications_accepted(&self) -> Option<bool> {
		self.bool(keys::ACCEPTED_NOTIFICATIONS)
	}

	pub fn set_notifications_accepted(&self, accepted: bool) {
		self.write(keys::ACCEPTED_NOTIFICATIONS, Value::Bool(accepted));
	}

	pub fn system_notifications_denied(&self) -> bool {
		self.bool(keys::SYSTEM_CLOSE_NOTIFICATIONS).unwrap_or(false)
	}

	pub fn set_system_notifications_denied(&self, denied: bool) {
		self.write(keys::SYSTEM_CLOSE_NOTIFICATIONS, Value::Bool(denied));
	}

	pub fn last_notification_prompt_at(&self) -> Option<i64> {
		self.timestamp(keys::LAST_NOTIFICATION_ASK)
	}

	pub fn set_last_notification_prompt_at(&self, at: i64) {
		self.write(keys::LAST_NOTIFICATION_ASK, Value::from(at));
	}

	pub fn pending_deep_link(&self) -> Option<Url> {
		self.url(keys::TEMP_URL)
	}

	pub fn set_pending_deep_link(&self, url: &Url) {
		self.write(keys::TEMP_URL, Value::String(url.to_string()));
	}

	/// Reads and clears the transient deep-link override.
	pub fn take_pending_deep_link(&self) -> Option<Url> {
		let url = self.pending_deep_link();
		if self.store.get(keys::TEMP_URL).is_some() {
			self.erase(keys::TEMP_URL);
		}
		url
	}

	pub fn push_token(&self) -> Option<String> {
		self.store
			.get(keys::FCM_TOKEN)
			.and_then(|value| value.as_str().map(str::to_string))
			.filter(|token| !token.is_empty())
	}

	pub fn set_push_token(&self, token: &str) {
		self.write(keys::FCM_TOKEN, Value::String(token.to_string()));
	}

	/// Raw cookie snapshot; decoding is left to the cookie adapter so that
	/// individual malformed records can be skipped.
	pub fn stored_cookies(&self) -> Option<Value> {
		self.store.get(keys::STORED_COOKIES)
	}

	pub fn set_stored_cookies(&self, snapshot: &CookieSnapshot) {
		match serde_json::to_value(snapshot) {
			Ok(value) => self.write(keys::STORED_COOKIES, value),
			Err(err) => warn!(target: "launchgate.settings", error = %err, "failed to encode cookie snapshot"),
		}
	}

	pub fn snapshot(&self) -> PersistedLaunchState {
		PersistedLaunchState {
			has_launched_before: self.has_launched(),
			app_mode: self.app_mode(),
			saved_content_url: self.saved_url(),
			saved_expiry: self.saved_expiry(),
			notifications_accepted: self.notifications_accepted(),
			system_notifications_denied: self.system_notifications_denied(),
			last_notification_prompt_at: self.last_notification_prompt_at(),
			pending_deep_link: self.pending_deep_link(),
			push_token: self.push_token(),
		}
	}

	/// Removes every key this crate owns.
	pub fn clear(&self) {
		for key in [
			keys::HAS_LAUNCHED,
			keys::APP_MODE,
			keys::SAVED_URL,
			keys::SAVED_EXPIRES,
			keys::ACCEPTED_NOTIFICATIONS,
			keys::SYSTEM_CLOSE_NOTIFICATIONS,
			keys::LAST_NOTIFICATION_ASK,
			keys::STORED_COOKIES,
			keys::TEMP_URL,
			keys::FCM_TOKEN,
		] {
			self.erase(key);
		}
	}

	fn bool(&self, key: &str) -> Option<bool> {
		self.store.get(key).and_then(|value| value.as_bool())
	}

	fn timestamp(&self, key: &str) -> Option<i64> {
		self.store
			.get(key)
			.and_then(|value| value.as_i64().or_else(|| value.as_f64().map(|secs| secs as i64)))
	}

	fn url(&self, key: &str) -> Option<Url> {
		self.store
			.get(key)
			.and_then(|value| value.as_str().and_then(|raw| Url::parse(raw).ok()))
	}

	fn write(&self, key: &str, value: Value) {
		if let Err(err) = self.store.set(key, value) {
			warn!(target: "launchgate.settings", key, error = %err, "failed to persist setting");
		}
	}

	fn erase(&self, key: &str) {
		if let Err(err) = self.store.remove(key) {
			warn!(target: "launchgate.settings", key, error = %err, "failed to remove setting");
		}
	}
}
