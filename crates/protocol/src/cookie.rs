//! Persisted cookie records and the per-domain snapshot layout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Cookie `SameSite` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
	Strict,
	Lax,
	None,
}

/// Full attribute set of one cookie, keyed by `(domain, name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
	pub name: String,
	pub value: String,
	pub domain: String,
	#[serde(default = "default_path")]
	pub path: String,
	/// Unix seconds; `None` for session cookies.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires: Option<f64>,
	#[serde(default)]
	pub secure: bool,
	#[serde(default)]
	pub http_only: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub same_site: Option<SameSite>,
	/// Attributes the surface reported that have no dedicated field (e.g. `Comment`, `Version`).
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub extra: BTreeMap<String, String>,
}

impl CookieRecord {
	pub fn new(domain: impl Into<String>, name: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
			domain: domain.into(),
			path: default_path(),
			expires: None,
			secure: false,
			http_only: false,
			same_site: None,
			extra: BTreeMap::new(),
		}
	}

	pub fn key(&self) -> (&str, &str) {
		(&self.domain, &self.name)
	}
}

fn default_path() -> String {
	"/".to_string()
}

/// Cookies of one domain keyed by cookie name.
pub type DomainCookies = BTreeMap<String, CookieRecord>;

/// Whole persisted jar: domain -> cookie name -> attributes.
pub type CookieSnapshot = BTreeMap<String, DomainCookies>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn minimal_record_fills_defaults() {
		let record: CookieRecord = serde_json::from_str(r#"{"name":"sid","value":"abc","domain":".example.com"}"#).unwrap();
		assert_eq!(record.path, "/");
		assert_eq!(record.expires, None);
		assert!(!record.secure);
		assert!(record.extra.is_empty());
	}

	#[test]
	fn record_uses_camel_case_attributes() {
		let mut record = CookieRecord::new("example.com", "sid", "abc");
		record.http_only = true;
		record.same_site = Some(SameSite::Lax);
		let value = serde_json::to_value(&record).unwrap();
		assert_eq!(value["httpOnly"], true);
		assert_eq!(value["sameSite"], "Lax");
		assert!(value.get("expires").is_none());
	}
}
