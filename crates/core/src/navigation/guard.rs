//! Per-surface circuit breaker for server redirect chains.

use url::Url;

/// Result of counting one server redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
	Continue { consecutive: u32 },
	/// Ceiling exceeded. The counter has already been reset.
	Tripped { recover_to: Option<Url> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectGuard {
	ceiling: u32,
	consecutive_server_redirects: u32,
	last_known_good: Option<Url>,
}

impl RedirectGuard {
	pub fn new(ceiling: u32) -> Self {
		Self {
			ceiling,
			consecutive_server_redirects: 0,
			last_known_good: None,
		}
	}

	pub fn consecutive_redirects(&self) -> u32 {
		self.consecutive_server_redirects
	}

	pub fn last_known_good(&self) -> Option<&Url> {
		self.last_known_good.as_ref()
	}

	pub fn record_redirect(&mut self) -> GuardVerdict {
		self.consecutive_server_redirects = self.consecutive_server_redirects.saturating_add(1);
		if self.consecutive_server_redirects > self.ceiling {
			self.consecutive_server_redirects = 0;
			return GuardVerdict::Tripped {
				recover_to: self.last_known_good.clone(),
			};
		}
		GuardVerdict::Continue {
			consecutive: self.consecutive_server_redirects,
		}
	}

	pub fn mark_good(&mut self, url: Url) {
		self.last_known_good = Some(url);
	}

	/// A navigation completed without redirecting.
	pub fn complete(&mut self, url: Option<Url>) {
		self.consecutive_server_redirects = 0;
		if let Some(url) = url {
			self.last_known_good = Some(url);
		}
	}

	pub fn reset_counter(&mut self) {
		self.consecutive_server_redirects = 0;
	}
}
