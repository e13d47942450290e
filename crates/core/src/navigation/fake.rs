//! In-memory surfaces for exercising the navigation controller without a web view.
//!
//! # Example
//!
//! ```ignore
//! let (primary, primary_log) = FakeSurface::new(SurfaceId::PRIMARY);
//! let host = FakeHost::new();
//! let mut session = NavigationSession::new(Box::new(primary), host.clone(), jar, &NavigationConfig::default());
//!
//! session.spawn_child(NewWindowRequest::new(SurfaceId::PRIMARY, "https://popup.example/"));
//! assert_eq!(host.child_log(SurfaceId(1)).unwrap().borrow().loads.len(), 1);
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use launchgate_protocol::CookieRecord;
use url::Url;

use super::surface::{Surface, SurfaceHost, SurfaceId};
use crate::error::{LaunchError, Result};

/// Everything a [`FakeSurface`] was asked to do.
#[derive(Debug, Default)]
pub struct SurfaceLog {
	pub current: Option<Url>,
	pub history: Vec<Url>,
	pub loads: Vec<Url>,
	pub stops: usize,
	pub back_steps: usize,
	pub adjustments: usize,
	pub fail_adjustment: bool,
	pub closed: bool,
	pub cookies: BTreeMap<(String, String), CookieRecord>,
}

pub type SharedLog = Rc<RefCell<SurfaceLog>>;

#[derive(Debug)]
pub struct FakeSurface {
	id: SurfaceId,
	log: SharedLog,
}

impl FakeSurface {
	/// Returns the surface and a handle to inspect it after it is boxed.
	pub fn new(id: SurfaceId) -> (Self, SharedLog) {
		let log = SharedLog::default();
		(Self { id, log: Rc::clone(&log) }, log)
	}
}

impl Surface for FakeSurface {
	fn id(&self) -> SurfaceId {
		self.id
	}

	fn load(&mut self, url: &Url) {
		let mut log = self.log.borrow_mut();
		if let Some(previous) = log.current.take() {
			log.history.push(previous);
		}
		log.current = Some(url.clone());
		log.loads.push(url.clone());
	}

	fn stop_loading(&mut self) {
		self.log.borrow_mut().stops += 1;
	}

	fn current_url(&self) -> Option<Url> {
		self.log.borrow().current.clone()
	}

	fn can_go_back(&self) -> bool {
		!self.log.borrow().history.is_empty()
	}

	fn go_back(&mut self) {
		let mut log = self.log.borrow_mut();
		if let Some(previous) = log.history.pop() {
			log.current = Some(previous);
			log.back_steps += 1;
		}
	}

	fn apply_content_adjustment(&mut self) -> Result<()> {
		let mut log = self.log.borrow_mut();
		if log.fail_adjustment {
			return Err(LaunchError::Surface("script evaluation failed".into()));
		}
		log.adjustments += 1;
		Ok(())
	}

	fn cookies(&self) -> Vec<CookieRecord> {
		self.log.borrow().cookies.values().cloned().collect()
	}

	fn set_cookie(&mut self, cookie: CookieRecord) -> Result<()> {
		if cookie.name.is_empty() || cookie.domain.is_empty() {
			return Err(LaunchError::Surface("cookie requires a name and a domain".into()));
		}
		self.log
			.borrow_mut()
			.cookies
			.insert((cookie.domain.clone(), cookie.name.clone()), cookie);
		Ok(())
	}

	fn close(&mut self) {
		self.log.borrow_mut().closed = true;
	}
}

/// Host that hands out [`FakeSurface`]s and records external opens.
///
/// Clones share state, so a test can keep one clone while the session owns another.
#[derive(Debug, Clone, Default)]
pub struct FakeHost {
	children: Rc<RefCell<Vec<(SurfaceId, SurfaceId, SharedLog)>>>,
	external: Rc<RefCell<Vec<Url>>>,
	refuse_children: Rc<RefCell<bool>>,
}

impl FakeHost {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn refuse_children(&self, refuse: bool) {
		*self.refuse_children.borrow_mut() = refuse;
	}

	pub fn child_log(&self, id: SurfaceId) -> Option<SharedLog> {
		self.children
			.borrow()
			.iter()
			.find(|(child, _, _)| *child == id)
			.map(|(_, _, log)| Rc::clone(log))
	}

	/// `(child, parent)` pairs in creation order.
	pub fn created(&self) -> Vec<(SurfaceId, SurfaceId)> {
		self.children.borrow().iter().map(|(child, parent, _)| (*child, *parent)).collect()
	}

	pub fn external_opens(&self) -> Vec<Url> {
		self.external.borrow().clone()
	}
}

impl SurfaceHost for FakeHost {
	fn create_child(&mut self, id: SurfaceId, parent: SurfaceId) -> Result<Box<dyn Surface>> {
		if *self.refuse_children.borrow() {
			return Err(LaunchError::Surface("host refused to create a surface".into()));
		}
		let (surface, log) = FakeSurface::new(id);
		self.children.borrow_mut().push((id, parent, log));
		Ok(Box::new(surface))
	}

	fn open_external(&mut self, url: &Url) {
		self.external.borrow_mut().push(url.clone());
	}
}
