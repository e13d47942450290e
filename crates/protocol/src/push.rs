//! Push-notification and deep-link payload helpers.

use serde_json::Value;

/// Extracts the deep-link address from a notification payload.
///
/// Looks at the top-level `url` first, then `data.url`. Blank strings count
/// as absent.
pub fn deep_link_url(payload: &Value) -> Option<&str> {
	payload
		.get("url")
		.and_then(Value::as_str)
		.filter(|url| !url.trim().is_empty())
		.or_else(|| {
			payload
				.get("data")
				.and_then(|data| data.get("url"))
				.and_then(Value::as_str)
				.filter(|url| !url.trim().is_empty())
		})
}
