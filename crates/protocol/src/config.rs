//! Remote config request and response shapes.
//!
//! Request body: the attribution fields merged with [`DeviceMetadata`].
//! Success response: `{"ok": true, "url": "<string>", "expires": <unix-seconds>}`.
//! Denial response: `{"ok": false, ...}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::attribution::AttributionPayload;

/// Platform identifier sent in the `os` field.
pub const PLATFORM_IOS: &str = "iOS";

/// Device and app identity fields appended to every config request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMetadata {
	pub af_id: String,
	pub bundle_id: String,
	pub os: String,
	pub store_id: String,
	pub locale: String,
	pub push_token: String,
	pub firebase_project_id: String,
}

impl DeviceMetadata {
	fn into_fields(self) -> Map<String, Value> {
		let mut fields = Map::new();
		fields.insert("af_id".into(), Value::String(self.af_id));
		fields.insert("bundle_id".into(), Value::String(self.bundle_id));
		fields.insert("os".into(), Value::String(self.os));
		fields.insert("store_id".into(), Value::String(self.store_id));
		fields.insert("locale".into(), Value::String(self.locale));
		fields.insert("push_token".into(), Value::String(self.push_token));
		fields.insert("firebase_project_id".into(), Value::String(self.firebase_project_id));
		fields
	}
}

/// Fully assembled config request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConfigRequest(Map<String, Value>);

impl ConfigRequest {
	/// Merges attribution fields with device metadata. Metadata keys win on conflict.
	pub fn new(attribution: &AttributionPayload, device: DeviceMetadata) -> Self {
		let mut body = attribution.fields().clone();
		body.extend(device.into_fields());
		Self(body)
	}

	pub fn fields(&self) -> &Map<String, Value> {
		&self.0
	}
}

/// Raw config endpoint response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigResponse {
	pub ok: bool,
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub expires: Option<f64>,
}

/// Interpreted outcome of one config call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigResult {
	pub approved: bool,
	pub content_url: Option<Url>,
	/// Unix seconds.
	pub expires_at: Option<i64>,
}

impl ConfigResult {
	pub fn denied() -> Self {
		Self {
			approved: false,
			content_url: None,
			expires_at: None,
		}
	}
}
