//! The control task that owns a [`LaunchResolver`].

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use launchgate::{Effect, LaunchDecision, LaunchEvent, LaunchResolver, PermissionOutcome};
use launchgate_protocol::AttributionPayload;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::{Result, RuntimeError};
use crate::remote::{AttributionEnricher, ConfigSource};

/// Asks the user for notification permission.
#[async_trait]
pub trait NotificationPrompter: Send + Sync {
	async fn prompt(&self) -> PermissionOutcome;
}

/// Answers every prompt with the same outcome. Used for headless runs.
#[derive(Debug, Clone, Copy)]
pub struct StaticPrompter(pub PermissionOutcome);

#[async_trait]
impl NotificationPrompter for StaticPrompter {
	async fn prompt(&self) -> PermissionOutcome {
		self.0
	}
}

/// External services the runtime calls on the resolver's behalf.
#[derive(Clone)]
pub struct Remotes {
	pub config: Arc<dyn ConfigSource>,
	pub enricher: Arc<dyn AttributionEnricher>,
	pub prompter: Arc<dyn NotificationPrompter>,
}

enum Inbound {
	Event(LaunchEvent),
	Shutdown,
}

/// Cloneable sender for events from collaborators (attribution SDK,
/// reachability monitor, push delivery).
#[derive(Clone)]
pub struct RuntimeHandle {
	tx: mpsc::UnboundedSender<Inbound>,
}

impl RuntimeHandle {
	pub fn send(&self, event: LaunchEvent) -> Result<()> {
		self.tx.send(Inbound::Event(event)).map_err(|_| RuntimeError::ChannelClosed)
	}

	pub fn start(&self) -> Result<()> {
		self.send(LaunchEvent::Start)
	}

	pub fn set_online(&self, online: bool) -> Result<()> {
		self.send(LaunchEvent::Reachability { online })
	}

	pub fn attribution(&self, payload: AttributionPayload) -> Result<()> {
		self.send(LaunchEvent::Attribution(payload))
	}

	pub fn attribution_failed(&self, device_id: impl Into<String>, reason: impl Into<String>) -> Result<()> {
		self.send(LaunchEvent::AttributionFailed {
			device_id: device_id.into(),
			reason: reason.into(),
		})
	}

	pub fn push(&self, payload: Value) -> Result<()> {
		self.send(LaunchEvent::PushPayload(payload))
	}

	/// Stops [`LaunchRuntime::run`] after the events already queued.
	pub fn shutdown(&self) -> Result<()> {
		self.tx.send(Inbound::Shutdown).map_err(|_| RuntimeError::ChannelClosed)
	}
}

/// Drives a [`LaunchResolver`] on the current task.
pub struct LaunchRuntime {
	resolver: LaunchResolver,
	remotes: Remotes,
	tx: mpsc::UnboundedSender<Inbound>,
	rx: mpsc::UnboundedReceiver<Inbound>,
	decision_tx: watch::Sender<LaunchDecision>,
	clock: Box<dyn Fn() -> i64 + Send>,
}

fn unix_now() -> i64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|elapsed| elapsed.as_secs() as i64)
		.unwrap_or_default()
}

impl LaunchRuntime {
	pub fn new(resolver: LaunchResolver, remotes: Remotes) -> Self {
		let (tx, rx) = mpsc::unbounded_channel();
		let (decision_tx, _) = watch::channel(resolver.decision().clone());
		Self {
			resolver,
			remotes,
			tx,
			rx,
			decision_tx,
			clock: Box::new(unix_now),
		}
	}

	/// Replaces the wall clock (unix seconds).
	pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + 'static) -> Self {
		self.clock = Box::new(clock);
		self
	}

	pub fn handle(&self) -> RuntimeHandle {
		RuntimeHandle { tx: self.tx.clone() }
	}

	/// Receives every decision the resolver presents.
	pub fn subscribe(&self) -> watch::Receiver<LaunchDecision> {
		self.decision_tx.subscribe()
	}

	pub fn resolver(&self) -> &LaunchResolver {
		&self.resolver
	}

	/// Processes events until the resolver settles on `Fallback` or a content session.
	pub async fn run_until_settled(&mut self) -> Result<LaunchDecision> {
		while !self.resolver.is_settled() {
			match self.rx.recv().await {
				Some(Inbound::Event(event)) => self.dispatch(event),
				Some(Inbound::Shutdown) | None => return Err(RuntimeError::ChannelClosed),
			}
		}
		Ok(self.resolver.decision().clone())
	}

	/// Processes events until [`RuntimeHandle::shutdown`]. Returns the resolver.
	pub async fn run(mut self) -> LaunchResolver {
		while let Some(Inbound::Event(event)) = self.rx.recv().await {
			self.dispatch(event);
		}
		debug!(target: "launchgate.runtime", "launch runtime stopped");
		self.resolver
	}

	fn dispatch(&mut self, event: LaunchEvent) {
		let now = (self.clock)();
		for effect in self.resolver.handle(event, now) {
			self.execute(effect);
		}
	}

	fn execute(&self, effect: Effect) {
		match effect {
			Effect::Present(decision) => {
				info!(target: "launchgate.runtime", %decision, "presenting");
				self.decision_tx.send_replace(decision);
			}
			Effect::FetchEnrichment { attempt, device_id } => {
				let enricher = Arc::clone(&self.remotes.enricher);
				let tx = self.tx.clone();
				tokio::spawn(async move {
					let fields = match enricher.enrich(&device_id).await {
						Ok(fields) => Some(fields),
						Err(err) => {
							warn!(target: "launchgate.runtime", attempt, error = %err, "install data lookup failed");
							None
						}
					};
					let _ = tx.send(Inbound::Event(LaunchEvent::EnrichmentFinished { attempt, fields }));
				});
			}
			Effect::FetchConfig { attempt, request } => {
				let config = Arc::clone(&self.remotes.config);
				let tx = self.tx.clone();
				tokio::spawn(async move {
					let result = config.fetch_config(&request).await;
					let _ = tx.send(Inbound::Event(LaunchEvent::ConfigFinished { attempt, result }));
				});
			}
			Effect::PromptNotifications => {
				let prompter = Arc::clone(&self.remotes.prompter);
				let tx = self.tx.clone();
				tokio::spawn(async move {
					let outcome = prompter.prompt().await;
					let _ = tx.send(Inbound::Event(LaunchEvent::NotificationPromptFinished(outcome)));
				});
			}
			Effect::ScheduleDeepLink { delay } => {
				let tx = self.tx.clone();
				tokio::spawn(async move {
					tokio::time::sleep(delay).await;
					let _ = tx.send(Inbound::Event(LaunchEvent::DeepLinkDue));
				});
			}
		}
	}
}
