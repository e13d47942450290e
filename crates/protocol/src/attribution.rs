//! Install attribution payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key carrying the install status (`Organic` or a campaign-specific value).
pub const INSTALL_STATUS_KEY: &str = "af_status";

/// Install status reported for installs with no campaign attribution.
pub const ORGANIC_STATUS: &str = "Organic";

/// One-shot attribution data for an install.
///
/// Holds the device identifier assigned by the attribution SDK and the flat
/// set of scalar fields it reported. Nested objects and arrays are dropped on
/// construction so the fields can be merged verbatim into a config request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionPayload {
	device_id: String,
	#[serde(default)]
	fields: Map<String, Value>,
}

impl AttributionPayload {
	/// Builds a payload from raw SDK fields, keeping only scalar values.
	pub fn new(device_id: impl Into<String>, fields: Map<String, Value>) -> Self {
		Self {
			device_id: device_id.into(),
			fields: scalars_only(fields),
		}
	}

	/// Payload with no attribution fields, used when the SDK reports a failure.
	pub fn empty(device_id: impl Into<String>) -> Self {
		Self::new(device_id, Map::new())
	}

	pub fn device_id(&self) -> &str {
		&self.device_id
	}

	pub fn fields(&self) -> &Map<String, Value> {
		&self.fields
	}

	pub fn install_status(&self) -> Option<&str> {
		self.fields.get(INSTALL_STATUS_KEY).and_then(Value::as_str)
	}

	pub fn is_organic(&self) -> bool {
		self.install_status() == Some(ORGANIC_STATUS)
	}

	/// Returns a copy with `extra` layered on top; keys in `extra` win.
	pub fn merged_with(&self, extra: Map<String, Value>) -> Self {
		let mut fields = self.fields.clone();
		fields.extend(scalars_only(extra));
		Self {
			device_id: self.device_id.clone(),
			fields,
		}
	}
}

fn scalars_only(fields: Map<String, Value>) -> Map<String, Value> {
	fields
		.into_iter()
		.filter(|(_, value)| !matches!(value, Value::Object(_) | Value::Array(_)))
		.collect()
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn object(value: Value) -> Map<String, Value> {
		match value {
			Value::Object(map) => map,
			_ => Map::new(),
		}
	}

	#[test]
	fn organic_status_is_detected() {
		let payload = AttributionPayload::new("uid-1", object(json!({ "af_status": "Organic" })));
		assert!(payload.is_organic());

		let paid = AttributionPayload::new("uid-1", object(json!({ "af_status": "Non-organic" })));
		assert!(!paid.is_organic());
		assert!(!AttributionPayload::empty("uid-1").is_organic());
	}

	#[test]
	fn nested_values_are_dropped() {
		let payload = AttributionPayload::new(
			"uid-1",
			object(json!({ "campaign": "spring", "nested": { "a": 1 }, "list": [1, 2], "is_first_launch": true })),
		);
		assert_eq!(payload.fields().len(), 2);
		assert_eq!(payload.fields()["campaign"], "spring");
		assert_eq!(payload.fields()["is_first_launch"], true);
	}

	#[test]
	fn merge_overrides_existing_keys_and_keeps_original_intact() {
		let original = AttributionPayload::new("uid-1", object(json!({ "af_status": "Organic", "media_source": "none" })));
		let merged = original.merged_with(object(json!({ "media_source": "search", "campaign": "c1" })));

		assert_eq!(merged.fields()["media_source"], "search");
		assert_eq!(merged.fields()["campaign"], "c1");
		assert_eq!(merged.device_id(), "uid-1");
		assert_eq!(original.fields()["media_source"], "none");
	}
}
