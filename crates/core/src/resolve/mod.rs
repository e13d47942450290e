//! Launch resolution state machine.
//!
//! [`LaunchResolver`] is a pure reducer: it consumes [`LaunchEvent`]s and
//! returns [`Effect`]s for the driver to execute. Network calls are requested
//! with an attempt number; results that come back tagged with an older
//! attempt are discarded, so a retry always supersedes pending work.
//!
//! Order of precedence for a fresh attempt:
//! sticky fallback, connectivity, attribution (plus organic enrichment on the
//! first launch), pending deep link, unexpired cached address, notification
//! prompt, remote config.

use launchgate_protocol::{AttributionPayload, ConfigRequest, ConfigResult, DeviceMetadata, deep_link_url};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::LaunchConfig;
use crate::error::ConfigFailure;
use crate::settings::{AppMode, LaunchSettings};

mod event;

pub use event::{Effect, LaunchDecision, LaunchEvent, PermissionOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
	Idle,
	AwaitingAttribution,
	Enriching { attempt: u64 },
	AwaitingPermission,
	FetchingConfig { attempt: u64 },
	/// Connectivity lost with a previously resolved content session; waits for recovery.
	Offline,
	Settled,
}

/// Converges on one [`LaunchDecision`] per process.
#[derive(Debug)]
pub struct LaunchResolver {
	settings: LaunchSettings,
	config: LaunchConfig,
	phase: Phase,
	decision: LaunchDecision,
	attempt: u64,
	online: bool,
	attribution: Option<AttributionPayload>,
	enriched: bool,
}

impl LaunchResolver {
	pub fn new(settings: LaunchSettings, config: LaunchConfig) -> Self {
		Self {
			settings,
			config,
			phase: Phase::Idle,
			decision: LaunchDecision::Loading,
			attempt: 0,
			online: true,
			attribution: None,
			enriched: false,
		}
	}

	pub fn decision(&self) -> &LaunchDecision {
		&self.decision
	}

	/// Current attempt number. Results tagged with any other value are stale.
	pub fn attempt(&self) -> u64 {
		self.attempt
	}

	/// True once `Fallback` or a `ContentSession` has been entered.
	pub fn is_settled(&self) -> bool {
		self.phase == Phase::Settled
	}

	pub fn settings(&self) -> &LaunchSettings {
		&self.settings
	}

	/// Applies one event. `now` is the current time in unix seconds.
	pub fn handle(&mut self, event: LaunchEvent, now: i64) -> Vec<Effect> {
		let mut effects = Vec::new();
		match event {
			LaunchEvent::Start => {
				if self.phase == Phase::Idle {
					self.begin(now, &mut effects);
				} else {
					debug!(target: "launchgate.resolve", "start ignored; resolution already running");
				}
			}
			LaunchEvent::Reachability { online } => self.on_reachability(online, now, &mut effects),
			LaunchEvent::Attribution(payload) => self.on_attribution(payload, now, &mut effects),
			LaunchEvent::AttributionFailed { device_id, reason } => {
				warn!(target: "launchgate.resolve", %reason, "attribution unavailable; continuing without it");
				self.on_attribution(AttributionPayload::empty(device_id), now, &mut effects);
			}
			LaunchEvent::EnrichmentFinished { attempt, fields } => {
				if self.phase != (Phase::Enriching { attempt }) {
					debug!(target: "launchgate.resolve", attempt, "discarding stale enrichment result");
					return effects;
				}
				self.enriched = true;
				if let (Some(fields), Some(payload)) = (fields, self.attribution.as_ref()) {
					self.attribution = Some(payload.merged_with(fields));
				}
				self.after_attribution(now, &mut effects);
			}
			LaunchEvent::NotificationPromptFinished(outcome) => {
				self.record_permission(outcome, now);
				if self.phase == Phase::AwaitingPermission {
					self.request_config(&mut effects);
				}
			}
			LaunchEvent::ConfigFinished { attempt, result } => {
				if self.phase != (Phase::FetchingConfig { attempt }) {
					debug!(target: "launchgate.resolve", attempt, "discarding stale config result");
					return effects;
				}
				self.on_config(result, &mut effects);
			}
			LaunchEvent::PushPayload(payload) => self.on_push(&payload, &mut effects),
			LaunchEvent::DeepLinkDue => self.on_deep_link_due(&mut effects),
		}
		effects
	}

	fn begin(&mut self, now: i64, effects: &mut Vec<Effect>) {
		self.attempt += 1;

		if self.settings.app_mode() == AppMode::Fallback {
			info!(target: "launchgate.resolve", "persisted fallback mode; skipping remote resolution");
			self.settle(LaunchDecision::Fallback, effects);
			return;
		}

		if !self.online {
			self.lose_connectivity(effects);
			return;
		}

		debug!(target: "launchgate.resolve", attempt = self.attempt, "resolution started");
		self.set_decision(LaunchDecision::Loading, effects);
		if self.attribution.is_some() {
			self.proceed_with_attribution(now, effects);
		} else {
			self.phase = Phase::AwaitingAttribution;
		}
	}

	fn on_reachability(&mut self, online: bool, now: i64, effects: &mut Vec<Effect>) {
		self.online = online;
		match (online, self.phase) {
			(_, Phase::Settled) | (_, Phase::Idle) => {}
			(false, Phase::Offline) => {}
			(false, _) => self.lose_connectivity(effects),
			(true, Phase::Offline) => {
				info!(target: "launchgate.resolve", "connectivity restored; retrying resolution");
				self.begin(now, effects);
			}
			(true, _) => {}
		}
	}

	fn lose_connectivity(&mut self, effects: &mut Vec<Effect>) {
		// Bumping the attempt orphans any in-flight request.
		self.attempt += 1;
		if self.settings.app_mode() == AppMode::ContentSession {
			warn!(target: "launchgate.resolve", "connectivity lost before resolution; showing offline notice");
			self.phase = Phase::Offline;
			self.set_decision(LaunchDecision::Offline, effects);
		} else {
			warn!(target: "launchgate.resolve", "connectivity lost on unresolved install; falling back");
			self.settle(LaunchDecision::Fallback, effects);
		}
	}

	fn on_attribution(&mut self, payload: AttributionPayload, now: i64, effects: &mut Vec<Effect>) {
		if self.attribution.is_some() {
			debug!(target: "launchgate.resolve", "attribution already received; ignoring repeat delivery");
			return;
		}
		debug!(
			target: "launchgate.resolve",
			status = payload.install_status().unwrap_or("unknown"),
			"attribution received"
		);
		self.attribution = Some(payload);
		if self.phase == Phase::AwaitingAttribution {
			self.proceed_with_attribution(now, effects);
		}
	}

	fn proceed_with_attribution(&mut self, now: i64, effects: &mut Vec<Effect>) {
		let Some(payload) = self.attribution.as_ref() else {
			self.phase = Phase::AwaitingAttribution;
			return;
		};

		if !self.enriched && !self.settings.has_launched() && payload.is_organic() {
			let device_id = payload.device_id().to_string();
			self.phase = Phase::Enriching { attempt: self.attempt };
			effects.push(Effect::FetchEnrichment {
				attempt: self.attempt,
				device_id,
			});
			return;
		}

		self.after_attribution(now, effects);
	}

	fn after_attribution(&mut self, now: i64, effects: &mut Vec<Effect>) {
		if let Some(url) = self.settings.take_pending_deep_link() {
			info!(target: "launchgate.resolve", %url, "pending deep link takes precedence");
			self.settle(LaunchDecision::ContentSession(url), effects);
			return;
		}

		if let Some(url) = self.settings.unexpired_content(now) {
			info!(target: "launchgate.resolve", %url, "using cached content address");
			self.settle(LaunchDecision::ContentSession(url), effects);
			return;
		}

		if self.needs_permission_prompt(now) {
			debug!(target: "launchgate.resolve", "suspending for notification permission prompt");
			self.phase = Phase::AwaitingPermission;
			effects.push(Effect::PromptNotifications);
			return;
		}

		self.request_config(effects);
	}

	fn needs_permission_prompt(&self, now: i64) -> bool {
		if self.settings.notifications_accepted().is_some() || self.settings.system_notifications_denied() {
			return false;
		}
		self.settings
			.last_notification_prompt_at()
			.is_none_or(|asked| now.saturating_sub(asked) >= self.config.notification_reprompt_secs())
	}

	fn record_permission(&self, outcome: PermissionOutcome, now: i64) {
		match outcome {
			PermissionOutcome::Granted => self.settings.set_notifications_accepted(true),
			PermissionOutcome::Denied => {
				self.settings.set_notifications_accepted(false);
				self.settings.set_system_notifications_denied(true);
			}
			PermissionOutcome::Skipped => self.settings.set_last_notification_prompt_at(now),
		}
	}

	fn request_config(&mut self, effects: &mut Vec<Effect>) {
		let payload = self.attribution.clone().unwrap_or_default();
		let device = DeviceMetadata {
			af_id: payload.device_id().to_string(),
			bundle_id: self.config.bundle_id.clone(),
			os: self.config.platform.clone(),
			store_id: self.config.store_id.clone(),
			locale: self.config.locale_or_default().to_string(),
			push_token: self.settings.push_token().unwrap_or_default(),
			firebase_project_id: self.config.firebase_project_id.clone(),
		};

		self.phase = Phase::FetchingConfig { attempt: self.attempt };
		debug!(target: "launchgate.resolve", attempt = self.attempt, "requesting remote config");
		effects.push(Effect::FetchConfig {
			attempt: self.attempt,
			request: ConfigRequest::new(&payload, device),
		});
	}

	fn on_config(&mut self, result: std::result::Result<ConfigResult, ConfigFailure>, effects: &mut Vec<Effect>) {
		match result {
			Ok(ConfigResult { approved: false, .. }) => {
				info!(target: "launchgate.resolve", "config denied; fallback is now permanent");
				self.settings.set_app_mode(AppMode::Fallback);
				self.settle(LaunchDecision::Fallback, effects);
			}
			Ok(ConfigResult {
				content_url: Some(url),
				expires_at,
				..
			}) => {
				info!(target: "launchgate.resolve", %url, expires_at, "config approved");
				self.settings.save_content(&url, expires_at);
				self.settings.set_app_mode(AppMode::ContentSession);
				self.settings.set_has_launched(true);
				self.settle(LaunchDecision::ContentSession(url), effects);
			}
			Ok(ConfigResult { content_url: None, .. }) => {
				self.on_config_failure(ConfigFailure::Decode("approved response without content address".into()), effects);
			}
			Err(failure) => self.on_config_failure(failure, effects),
		}
	}

	fn on_config_failure(&mut self, failure: ConfigFailure, effects: &mut Vec<Effect>) {
		warn!(target: "launchgate.resolve", error = %failure, "config failure");
		if let Some(url) = self.settings.saved_url() {
			info!(target: "launchgate.resolve", %url, "recovering with saved content address");
			self.settle(LaunchDecision::ContentSession(url), effects);
		} else {
			self.settings.set_app_mode(AppMode::Fallback);
			self.settle(LaunchDecision::Fallback, effects);
		}
	}

	fn on_push(&mut self, payload: &serde_json::Value, effects: &mut Vec<Effect>) {
		let Some(raw) = deep_link_url(payload) else {
			debug!(target: "launchgate.resolve", "push payload carries no url");
			return;
		};
		let url = match Url::parse(raw) {
			Ok(url) => url,
			Err(err) => {
				warn!(target: "launchgate.resolve", url = raw, error = %err, "ignoring malformed deep link");
				return;
			}
		};
		self.settings.set_pending_deep_link(&url);
		effects.push(Effect::ScheduleDeepLink {
			delay: self.config.deep_link_delay(),
		});
	}

	fn on_deep_link_due(&mut self, effects: &mut Vec<Effect>) {
		match (&self.decision, self.phase) {
			(LaunchDecision::ContentSession(_), Phase::Settled) => {
				if let Some(url) = self.settings.take_pending_deep_link() {
					info!(target: "launchgate.resolve", %url, "switching content session to deep link");
					self.decision = LaunchDecision::ContentSession(url.clone());
					effects.push(Effect::Present(LaunchDecision::ContentSession(url)));
				}
			}
			(LaunchDecision::Fallback, Phase::Settled) => {
				if self.settings.take_pending_deep_link().is_some() {
					debug!(target: "launchgate.resolve", "deep link dropped; fallback mode is active");
				}
			}
			// Still resolving: the pending link is consumed when resolution settles.
			_ => {}
		}
	}

	/// A deep link that became pending after the resolver last looked for one
	/// still wins over the resolved address for this session only. Fallback
	/// discards it.
	fn settle(&mut self, decision: LaunchDecision, effects: &mut Vec<Effect>) {
		let decision = match decision {
			LaunchDecision::ContentSession(resolved) => match self.settings.take_pending_deep_link() {
				Some(url) => {
					info!(target: "launchgate.resolve", %url, %resolved, "pending deep link overrides resolved address");
					LaunchDecision::ContentSession(url)
				}
				None => LaunchDecision::ContentSession(resolved),
			},
			LaunchDecision::Fallback => {
				if self.settings.take_pending_deep_link().is_some() {
					debug!(target: "launchgate.resolve", "deep link dropped; fallback mode is active");
				}
				LaunchDecision::Fallback
			}
			other => other,
		};
		self.phase = Phase::Settled;
		self.set_decision(decision, effects);
	}

	fn set_decision(&mut self, decision: LaunchDecision, effects: &mut Vec<Effect>) {
		if self.decision != decision {
			self.decision = decision.clone();
			effects.push(Effect::Present(decision));
		}
	}
}
