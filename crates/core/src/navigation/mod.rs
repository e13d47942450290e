//! Primary/child surface supervision.
//!
//! [`NavigationSession`] owns the primary surface and a stack of child
//! surfaces (most recent last). Each surface carries its own
//! [`RedirectGuard`] and lifecycle [`SurfacePhase`]. The stack is only
//! mutated through the session's `&mut self` API.

pub mod fake;
mod guard;
mod surface;

#[cfg(test)]
mod tests;

pub use guard::{GuardVerdict, RedirectGuard};
pub use surface::{
	AuthChallenge, ChallengeDisposition, ChallengeKind, NavigationError, NavigationPolicy, NewWindowRequest, Surface,
	SurfaceEvent, SurfaceHost, SurfaceId, SurfacePhase,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{NavigationConfig, TrustPolicy};
use crate::cookies::CookieJarSync;

/// A child surface spawned by [`NavigationSession::spawn_child`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildHandle(SurfaceId);

impl ChildHandle {
	pub fn id(self) -> SurfaceId {
		self.0
	}
}

/// What [`NavigationSession::handle_back_navigation`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackOutcome {
	/// The top child was destroyed; the primary was reloaded when an address was supplied.
	DismissedChild { child: SurfaceId, reloaded: Option<Url> },
	SteppedBack,
	Ignored,
}

/// What [`NavigationSession::on_provisional_load_failure`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOutcome {
	Recovered(Url),
	Reported(NavigationError),
}

/// Result of feeding a [`SurfaceEvent`] through [`NavigationSession::handle_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
	Handled,
	/// The event named a surface the session does not own.
	UnknownSurface(SurfaceId),
	ChildOpened(ChildHandle),
	ChildDeclined,
	Redirect(GuardVerdict),
	Failure(FailureOutcome),
	Back(BackOutcome),
}

struct SurfaceSlot {
	surface: Box<dyn Surface>,
	guard: RedirectGuard,
	phase: SurfacePhase,
	/// Content adjustment already applied for the current navigation.
	adjusted: bool,
}

impl SurfaceSlot {
	fn new(surface: Box<dyn Surface>, ceiling: u32) -> Self {
		Self {
			surface,
			guard: RedirectGuard::new(ceiling),
			phase: SurfacePhase::Idle,
			adjusted: false,
		}
	}

	fn id(&self) -> SurfaceId {
		self.surface.id()
	}

	fn navigate(&mut self, url: &Url) {
		self.phase = SurfacePhase::Loading;
		self.adjusted = false;
		self.surface.load(url);
	}
}

fn find_slot<'a>(
	primary: &'a mut SurfaceSlot,
	children: &'a mut [SurfaceSlot],
	id: SurfaceId,
) -> Option<&'a mut SurfaceSlot> {
	if primary.id() == id {
		return Some(primary);
	}
	children.iter_mut().find(|slot| slot.id() == id)
}

/// One primary surface plus its overlay children.
pub struct NavigationSession<H: SurfaceHost> {
	primary: SurfaceSlot,
	children: Vec<SurfaceSlot>,
	host: H,
	cookies: CookieJarSync,
	trust_policy: TrustPolicy,
	redirect_ceiling: u32,
	next_id: u64,
}

impl<H: SurfaceHost> NavigationSession<H> {
	/// Takes ownership of `primary` and restores the persisted cookie jar into it.
	pub fn new(mut primary: Box<dyn Surface>, host: H, cookies: CookieJarSync, config: &NavigationConfig) -> Self {
		let summary = cookies.import_all_cookies(primary.as_mut());
		debug!(
			target: "launchgate.nav",
			applied = summary.applied,
			skipped = summary.skipped,
			"navigation session created"
		);
		let next_id = primary.id().0 + 1;
		Self {
			primary: SurfaceSlot::new(primary, config.redirect_ceiling),
			children: Vec::new(),
			host,
			cookies,
			trust_policy: config.trust_policy,
			redirect_ceiling: config.redirect_ceiling,
			next_id,
		}
	}

	pub fn primary_id(&self) -> SurfaceId {
		self.primary.id()
	}

	pub fn primary(&self) -> &dyn Surface {
		self.primary.surface.as_ref()
	}

	pub fn host(&self) -> &H {
		&self.host
	}

	pub fn children_len(&self) -> usize {
		self.children.len()
	}

	/// Child ids, oldest first.
	pub fn child_ids(&self) -> Vec<SurfaceId> {
		self.children.iter().map(SurfaceSlot::id).collect()
	}

	pub fn phase(&self, id: SurfaceId) -> Option<SurfacePhase> {
		self.slot(id).map(|slot| slot.phase)
	}

	pub fn guard(&self, id: SurfaceId) -> Option<&RedirectGuard> {
		self.slot(id).map(|slot| &slot.guard)
	}

	fn slot(&self, id: SurfaceId) -> Option<&SurfaceSlot> {
		if self.primary.id() == id {
			return Some(&self.primary);
		}
		self.children.iter().find(|slot| slot.id() == id)
	}

	/// Navigates the primary surface. Starts a fresh redirect count.
	pub fn load_primary(&mut self, url: &Url) {
		info!(target: "launchgate.nav", %url, "loading primary surface");
		self.primary.guard.reset_counter();
		self.primary.navigate(url);
	}

	/// Opens a child above `request.opener`.
	///
	/// Declines when the request targets an existing frame or the host cannot
	/// create a surface. Blank and placeholder addresses create the child
	/// without navigating it.
	pub fn spawn_child(&mut self, request: NewWindowRequest) -> Option<ChildHandle> {
		if request.targets_existing_frame {
			debug!(target: "launchgate.nav", opener = %request.opener, "new-window request targets an existing frame; declined");
			return None;
		}

		let id = SurfaceId(self.next_id);
		let mut surface = match self.host.create_child(id, request.opener) {
			Ok(surface) => surface,
			Err(err) => {
				warn!(target: "launchgate.nav", opener = %request.opener, error = %err, "child surface creation failed");
				return None;
			}
		};
		self.next_id += 1;

		self.cookies.import_all_cookies(surface.as_mut());
		let mut slot = SurfaceSlot::new(surface, self.redirect_ceiling);
		match request.navigable_url() {
			Some(url) => {
				debug!(target: "launchgate.nav", child = %id, %url, "child surface opened");
				slot.navigate(&url);
			}
			None => debug!(target: "launchgate.nav", child = %id, "child surface opened without navigation"),
		}
		self.children.push(slot);
		Some(ChildHandle(id))
	}

	/// Pops and destroys the most recent child. No-op on an empty stack.
	pub fn dismiss_top_child(&mut self) -> Option<SurfaceId> {
		let mut slot = self.children.pop()?;
		slot.surface.close();
		debug!(target: "launchgate.nav", child = %slot.id(), remaining = self.children.len(), "child surface dismissed");
		Some(slot.id())
	}

	/// Removes a specific child, e.g. when its page closes itself.
	pub fn close_child(&mut self, id: SurfaceId) -> bool {
		let Some(index) = self.children.iter().position(|slot| slot.id() == id) else {
			return false;
		};
		let mut slot = self.children.remove(index);
		slot.surface.close();
		debug!(target: "launchgate.nav", child = %id, remaining = self.children.len(), "child surface closed");
		true
	}

	pub fn handle_back_navigation(&mut self, active_url: Option<&Url>) -> BackOutcome {
		if let Some(child) = self.dismiss_top_child() {
			if let Some(url) = active_url {
				self.load_primary(url);
			}
			return BackOutcome::DismissedChild {
				child,
				reloaded: active_url.cloned(),
			};
		}
		if self.primary.surface.can_go_back() {
			self.primary.surface.go_back();
			return BackOutcome::SteppedBack;
		}
		BackOutcome::Ignored
	}

	/// A surface began a new navigation.
	pub fn on_load_started(&mut self, id: SurfaceId) -> bool {
		let Some(slot) = find_slot(&mut self.primary, &mut self.children, id) else {
			return false;
		};
		slot.phase = SurfacePhase::Loading;
		slot.adjusted = false;
		true
	}

	/// Counts a server redirect. Trips the breaker once the ceiling is exceeded.
	pub fn on_server_redirect(&mut self, id: SurfaceId) -> Option<GuardVerdict> {
		let slot = find_slot(&mut self.primary, &mut self.children, id)?;
		slot.phase = SurfacePhase::Loading;
		let verdict = slot.guard.record_redirect();
		match &verdict {
			GuardVerdict::Tripped { recover_to } => {
				warn!(
					target: "launchgate.nav",
					surface = %id,
					recover_to = recover_to.as_ref().map(Url::as_str),
					"redirect ceiling exceeded; halting"
				);
				slot.surface.stop_loading();
				match recover_to {
					Some(url) => slot.navigate(url),
					None => slot.phase = SurfacePhase::Failed,
				}
			}
			GuardVerdict::Continue { consecutive } => {
				if let Some(url) = slot.surface.current_url() {
					slot.guard.mark_good(url);
				}
				debug!(target: "launchgate.nav", surface = %id, consecutive, "server redirect");
				self.cookies.export_domain_cookies(slot.surface.as_ref());
			}
		}
		Some(verdict)
	}

	/// Reloads last-known-good after a redirect loop; every other failure is reported.
	pub fn on_provisional_load_failure(&mut self, id: SurfaceId, error: NavigationError) -> FailureOutcome {
		let Some(slot) = find_slot(&mut self.primary, &mut self.children, id) else {
			return FailureOutcome::Reported(error);
		};
		slot.phase = SurfacePhase::Failed;
		let recovery = match error {
			NavigationError::TooManyRedirects => slot.guard.last_known_good().cloned(),
			_ => None,
		};
		if let Some(url) = recovery {
			info!(target: "launchgate.nav", surface = %id, %url, "recovering from redirect loop");
			slot.guard.reset_counter();
			slot.navigate(&url);
			return FailureOutcome::Recovered(url);
		}
		warn!(target: "launchgate.nav", surface = %id, error = %error, "provisional navigation failed");
		FailureOutcome::Reported(error)
	}

	/// Marks the navigation complete, applies the content adjustment once, and persists cookies.
	pub fn on_load_finished(&mut self, id: SurfaceId) -> bool {
		let Some(slot) = find_slot(&mut self.primary, &mut self.children, id) else {
			return false;
		};
		slot.phase = SurfacePhase::Loaded;
		slot.guard.complete(slot.surface.current_url());
		if !slot.adjusted {
			slot.adjusted = true;
			if let Err(err) = slot.surface.apply_content_adjustment() {
				warn!(target: "launchgate.nav", surface = %id, error = %err, "content adjustment failed");
			}
		}
		self.cookies.export_domain_cookies(slot.surface.as_ref());
		true
	}

	/// Keeps web transports in-surface; hands every other scheme to the platform.
	pub fn on_external_scheme_request(&mut self, id: SurfaceId, url: &Url) -> NavigationPolicy {
		match url.scheme() {
			"http" | "https" => {
				if let Some(slot) = find_slot(&mut self.primary, &mut self.children, id) {
					slot.guard.mark_good(url.clone());
				}
				NavigationPolicy::Allow
			}
			"about" if url.path() == "blank" => NavigationPolicy::Allow,
			scheme => {
				info!(target: "launchgate.nav", surface = %id, scheme, "opening externally");
				self.host.open_external(url);
				NavigationPolicy::Cancel
			}
		}
	}

	pub fn authenticate_server_trust(&self, challenge: &AuthChallenge) -> ChallengeDisposition {
		match (challenge.kind, self.trust_policy) {
			(ChallengeKind::ServerTrust, TrustPolicy::AcceptPresented) => {
				debug!(target: "launchgate.nav", host = %challenge.host, "accepting presented server trust");
				ChallengeDisposition::AcceptPresentedTrust
			}
			_ => ChallengeDisposition::PerformDefaultHandling,
		}
	}

	/// Dispatches one navigation notification.
	pub fn handle_event(&mut self, event: SurfaceEvent) -> EventOutcome {
		match event {
			SurfaceEvent::LoadStarted(id) => self.known(id, |session| session.on_load_started(id)),
			SurfaceEvent::LoadFinished(id) => self.known(id, |session| session.on_load_finished(id)),
			SurfaceEvent::ServerRedirect(id) => match self.on_server_redirect(id) {
				Some(verdict) => EventOutcome::Redirect(verdict),
				None => EventOutcome::UnknownSurface(id),
			},
			SurfaceEvent::ProvisionalFailure(id, error) => {
				if self.slot(id).is_none() {
					return EventOutcome::UnknownSurface(id);
				}
				EventOutcome::Failure(self.on_provisional_load_failure(id, error))
			}
			SurfaceEvent::NewWindow(request) => match self.spawn_child(request) {
				Some(handle) => EventOutcome::ChildOpened(handle),
				None => EventOutcome::ChildDeclined,
			},
			SurfaceEvent::CloseRequested(id) => self.known(id, |session| session.close_child(id)),
			SurfaceEvent::Back { active_url } => EventOutcome::Back(self.handle_back_navigation(active_url.as_ref())),
		}
	}

	fn known(&mut self, id: SurfaceId, apply: impl FnOnce(&mut Self) -> bool) -> EventOutcome {
		if apply(self) {
			EventOutcome::Handled
		} else {
			EventOutcome::UnknownSurface(id)
		}
	}
}
