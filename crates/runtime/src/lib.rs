//! Async execution for [`launchgate::LaunchResolver`].
//!
//! The resolver is a pure reducer. [`LaunchRuntime`] owns it on a single task,
//! executes the effects it asks for (config and enrichment calls, the
//! notification prompt, deep-link timers) on spawned tasks, and feeds their
//! results back through one channel. Decisions are published on a
//! [`tokio::sync::watch`] channel.

pub mod driver;
pub mod error;
pub mod remote;

pub use driver::{LaunchRuntime, NotificationPrompter, Remotes, RuntimeHandle, StaticPrompter};
pub use error::{Result, RuntimeError};
pub use remote::{AttributionEnricher, ConfigSource, HttpAttributionClient, HttpConfigClient, interpret_response};
