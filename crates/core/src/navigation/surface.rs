//! Surface abstraction and navigation event types.

use std::fmt;

use launchgate_protocol::CookieRecord;
use thiserror::Error;
use url::Url;

use crate::error::Result;

/// Identifies one surface within a session. The primary is always [`SurfaceId::PRIMARY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl SurfaceId {
	pub const PRIMARY: SurfaceId = SurfaceId(0);
}

impl fmt::Display for SurfaceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "surface#{}", self.0)
	}
}

/// An in-process browsing context able to load addresses and hold cookies.
///
/// Implemented by the host's web view wrapper. All calls happen on the
/// control thread.
pub trait Surface {
	fn id(&self) -> SurfaceId;

	fn load(&mut self, url: &Url);

	fn stop_loading(&mut self);

	fn current_url(&self) -> Option<Url>;

	fn can_go_back(&self) -> bool;

	fn go_back(&mut self);

	/// Viewport/zoom lock and touch-gesture normalization for the loaded page.
	fn apply_content_adjustment(&mut self) -> Result<()>;

	fn cookies(&self) -> Vec<CookieRecord>;

	fn set_cookie(&mut self, cookie: CookieRecord) -> Result<()>;

	/// Detaches and destroys the backing view.
	fn close(&mut self);
}

/// Host services the session needs beyond a single surface.
pub trait SurfaceHost {
	/// Creates a surface overlaid above `parent`, sharing its configuration.
	fn create_child(&mut self, id: SurfaceId, parent: SurfaceId) -> Result<Box<dyn Surface>>;

	/// Hands an address to the platform's external-open facility.
	fn open_external(&mut self, url: &Url);
}

/// Lifecycle of a single surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfacePhase {
	#[default]
	Idle,
	Loading,
	Loaded,
	Failed,
}

/// A request from page content to open a new browsing context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWindowRequest {
	pub opener: SurfaceId,
	/// Requested address; may be empty or `about:blank`.
	pub url: Option<String>,
	/// True when the request names an existing frame rather than asking for a new top-level context.
	pub targets_existing_frame: bool,
}

impl NewWindowRequest {
	pub fn new(opener: SurfaceId, url: impl Into<String>) -> Self {
		Self {
			opener,
			url: Some(url.into()),
			targets_existing_frame: false,
		}
	}

	/// Address worth navigating to, skipping blanks and internal placeholders.
	pub fn navigable_url(&self) -> Option<Url> {
		let raw = self.url.as_deref()?.trim();
		if raw.is_empty() || raw.eq_ignore_ascii_case("about:blank") {
			return None;
		}
		Url::parse(raw).ok()
	}
}

/// Provisional navigation failures reported by a surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
	#[error("too many redirects")]
	TooManyRedirects,

	#[error("navigation cancelled")]
	Cancelled,

	#[error("network error: {0}")]
	Network(String),

	#[error("navigation failed ({code}): {message}")]
	Other { code: i64, message: String },
}

/// Decision for an in-surface navigation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPolicy {
	Allow,
	Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeKind {
	ServerTrust,
	HttpBasic,
	HttpDigest,
	ClientCertificate,
	Other,
}

/// Authentication challenge raised while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
	pub kind: ChallengeKind,
	pub host: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeDisposition {
	/// Use a credential built from the trust the server presented.
	AcceptPresentedTrust,
	PerformDefaultHandling,
}

/// Navigation lifecycle notifications delivered to the control thread.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
	LoadStarted(SurfaceId),
	ServerRedirect(SurfaceId),
	ProvisionalFailure(SurfaceId, NavigationError),
	LoadFinished(SurfaceId),
	NewWindow(NewWindowRequest),
	/// Page script closed its own window.
	CloseRequested(SurfaceId),
	/// Back-edge swipe or explicit back action.
	Back { active_url: Option<Url> },
}
