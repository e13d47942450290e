//! Launch-time mode resolution and content-session navigation.
//!
//! This crate holds the synchronous core of the client:
//!
//! - [`resolve`]: decides between a content session, the fallback experience,
//!   and the offline notice, persisting durable outcomes.
//! - [`navigation`]: supervises the primary surface and its popup children,
//!   with per-surface redirect protection.
//! - [`cookies`]: moves cookie jars between surfaces and the settings store.
//! - [`settings`]: typed access to the persisted key space.
//!
//! Nothing here performs I/O beyond the settings store. Network calls,
//! timers and reachability are driven by `launchgate-runtime`.

pub mod config;
pub mod cookies;
pub mod error;
pub mod navigation;
pub mod resolve;
pub mod settings;

pub use config::{LaunchConfig, NavigationConfig, TrustPolicy};
pub use cookies::{CookieImportSummary, CookieJarSync};
pub use error::{ConfigFailure, LaunchError, Result};
pub use navigation::{NavigationSession, Surface, SurfaceEvent, SurfaceHost, SurfaceId};
pub use resolve::{Effect, LaunchDecision, LaunchEvent, LaunchResolver, PermissionOutcome};
pub use settings::{AppMode, FileStore, KeyValueStore, LaunchSettings, MemoryStore};
