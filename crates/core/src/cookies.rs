//! Cookie persistence between surfaces and the durable store.
//!
//! The snapshot layout is `domain -> cookie name -> attributes`. Export fully
//! replaces the stored snapshot; import inserts records one at a time and
//! skips any that fail to decode or that the surface rejects.

use launchgate_protocol::{CookieRecord, CookieSnapshot};
use serde_json::Value;
use tracing::{debug, warn};

use crate::navigation::Surface;
use crate::settings::LaunchSettings;

/// Outcome of [`CookieJarSync::import_all_cookies`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CookieImportSummary {
	pub applied: usize,
	pub skipped: usize,
}

/// Moves cookies between a surface's session store and [`LaunchSettings`].
#[derive(Debug, Clone)]
pub struct CookieJarSync {
	settings: LaunchSettings,
}

impl CookieJarSync {
	pub fn new(settings: LaunchSettings) -> Self {
		Self { settings }
	}

	/// Snapshots every cookie on `surface` and overwrites the stored snapshot.
	pub fn export_domain_cookies(&self, surface: &dyn Surface) -> CookieSnapshot {
		let snapshot = group_by_domain(surface.cookies());
		self.settings.set_stored_cookies(&snapshot);
		debug!(
			target: "launchgate.cookies",
			surface = %surface.id(),
			domains = snapshot.len(),
			"exported cookie snapshot"
		);
		snapshot
	}

	/// Inserts every stored cookie into `surface`. A missing snapshot is a no-op.
	pub fn import_all_cookies(&self, surface: &mut dyn Surface) -> CookieImportSummary {
		let mut summary = CookieImportSummary::default();
		let Some(stored) = self.settings.stored_cookies() else {
			return summary;
		};
		let Value::Object(domains) = stored else {
			warn!(target: "launchgate.cookies", "stored cookie snapshot is not an object; ignoring");
			return summary;
		};

		for (domain, cookies) in domains {
			let Value::Object(cookies) = cookies else {
				warn!(target: "launchgate.cookies", %domain, "skipping malformed domain entry");
				summary.skipped += 1;
				continue;
			};
			for (name, raw) in cookies {
				let record = match serde_json::from_value::<CookieRecord>(raw) {
					Ok(record) => record,
					Err(err) => {
						warn!(target: "launchgate.cookies", %domain, %name, error = %err, "skipping malformed cookie");
						summary.skipped += 1;
						continue;
					}
				};
				match surface.set_cookie(record) {
					Ok(()) => summary.applied += 1,
					Err(err) => {
						warn!(target: "launchgate.cookies", %domain, %name, error = %err, "surface rejected cookie");
						summary.skipped += 1;
					}
				}
			}
		}

		debug!(
			target: "launchgate.cookies",
			surface = %surface.id(),
			applied = summary.applied,
			skipped = summary.skipped,
			"imported cookie snapshot"
		);
		summary
	}
}

/// Groups cookies by domain, then by name. Later duplicates win.
pub fn group_by_domain(cookies: impl IntoIterator<Item = CookieRecord>) -> CookieSnapshot {
	let mut snapshot = CookieSnapshot::new();
	for cookie in cookies {
		snapshot
			.entry(cookie.domain.clone())
			.or_default()
			.insert(cookie.name.clone(), cookie);
	}
	snapshot
}
