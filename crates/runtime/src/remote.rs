//! HTTP collaborators: the remote config endpoint and install-data enrichment.

use std::time::Duration;

use async_trait::async_trait;
use launchgate::{ConfigFailure, LaunchConfig};
use launchgate_protocol::{ConfigRequest, ConfigResponse, ConfigResult};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Result, RuntimeError};

/// Issues one config request and interprets the answer.
#[async_trait]
pub trait ConfigSource: Send + Sync {
	async fn fetch_config(&self, request: &ConfigRequest) -> std::result::Result<ConfigResult, ConfigFailure>;
}

/// Looks up extra install fields for an organic first launch.
#[async_trait]
pub trait AttributionEnricher: Send + Sync {
	async fn enrich(&self, device_id: &str) -> Result<Map<String, Value>>;
}

/// Maps a decoded config response to a [`ConfigResult`].
///
/// `ok: true` must carry a parseable `url`; anything else is a decode failure.
pub fn interpret_response(response: ConfigResponse) -> std::result::Result<ConfigResult, ConfigFailure> {
	if !response.ok {
		return Ok(ConfigResult::denied());
	}
	let raw = response
		.url
		.filter(|raw| !raw.trim().is_empty())
		.ok_or_else(|| ConfigFailure::Decode("approved response without url".into()))?;
	let content_url = Url::parse(raw.trim()).map_err(|e| ConfigFailure::Decode(format!("invalid url {raw:?}: {e}")))?;
	Ok(ConfigResult {
		approved: true,
		content_url: Some(content_url),
		expires_at: response.expires.filter(|secs| secs.is_finite()).map(|secs| secs as i64),
	})
}

/// `POST <config-endpoint>` with a JSON body.
#[derive(Debug, Clone)]
pub struct HttpConfigClient {
	client: reqwest::Client,
	endpoint: Option<Url>,
}

impl HttpConfigClient {
	pub fn new(endpoint: Option<Url>, timeout: Duration) -> Result<Self> {
		let client = reqwest::Client::builder().timeout(timeout).build()?;
		Ok(Self { client, endpoint })
	}

	pub fn from_config(config: &LaunchConfig) -> Result<Self> {
		Self::new(config.config_endpoint.clone(), config.config_timeout())
	}
}

#[async_trait]
impl ConfigSource for HttpConfigClient {
	async fn fetch_config(&self, request: &ConfigRequest) -> std::result::Result<ConfigResult, ConfigFailure> {
		let Some(endpoint) = self.endpoint.as_ref() else {
			return Err(ConfigFailure::Request("no config endpoint configured".into()));
		};
		debug!(target: "launchgate.remote", url = %endpoint, "posting config request");

		let response = self
			.client
			.post(endpoint.clone())
			.header(CONTENT_TYPE, "application/json")
			.json(request)
			.send()
			.await
			.map_err(|e| {
				if e.is_builder() {
					ConfigFailure::Request(e.to_string())
				} else {
					ConfigFailure::Transport(e.to_string())
				}
			})?;

		let status = response.status();
		if status != StatusCode::OK {
			warn!(target: "launchgate.remote", status = status.as_u16(), "config endpoint returned non-200");
			return Err(ConfigFailure::Status(status.as_u16()));
		}

		let body = response
			.bytes()
			.await
			.map_err(|e| ConfigFailure::Transport(e.to_string()))?;
		let decoded: ConfigResponse =
			serde_json::from_slice(&body).map_err(|e| ConfigFailure::Decode(e.to_string()))?;
		interpret_response(decoded)
	}
}

/// `GET <base>/install_data/v4.0/id<store-id>?devkey=<key>&device_id=<uid>`.
#[derive(Debug, Clone)]
pub struct HttpAttributionClient {
	client: reqwest::Client,
	base: Option<Url>,
	store_id: String,
	dev_key: String,
}

impl HttpAttributionClient {
	pub fn new(base: Option<Url>, store_id: impl Into<String>, dev_key: impl Into<String>, timeout: Duration) -> Result<Self> {
		let client = reqwest::Client::builder().timeout(timeout).build()?;
		Ok(Self {
			client,
			base,
			store_id: store_id.into(),
			dev_key: dev_key.into(),
		})
	}

	pub fn from_config(config: &LaunchConfig) -> Result<Self> {
		Self::new(
			config.attribution_endpoint.clone(),
			config.store_id.clone(),
			config.dev_key.clone(),
			config.enrichment_timeout(),
		)
	}

	/// Full lookup address for `device_id`.
	pub fn lookup_url(&self, device_id: &str) -> Result<Url> {
		let base = self.base.as_ref().ok_or(RuntimeError::NotConfigured("attribution endpoint"))?;
		let mut url = base
			.join(&format!("install_data/v4.0/id{}", self.store_id))
			.map_err(|e| RuntimeError::Decode(format!("invalid attribution endpoint: {e}")))?;
		url.query_pairs_mut()
			.append_pair("devkey", &self.dev_key)
			.append_pair("device_id", device_id);
		Ok(url)
	}
}

#[async_trait]
impl AttributionEnricher for HttpAttributionClient {
	async fn enrich(&self, device_id: &str) -> Result<Map<String, Value>> {
		let url = self.lookup_url(device_id)?;
		debug!(target: "launchgate.remote", store_id = %self.store_id, "fetching install data");

		let value: Value = self
			.client
			.get(url)
			.header(ACCEPT, "application/json")
			.send()
			.await?
			.error_for_status()?
			.json()
			.await?;

		match value {
			Value::Object(fields) => Ok(fields),
			other => Err(RuntimeError::Decode(format!("install data is not an object: {other}"))),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn denial_ignores_other_fields() {
		let response = ConfigResponse {
			ok: false,
			url: Some("https://a.example/".into()),
			expires: Some(1.0),
		};
		assert_eq!(interpret_response(response), Ok(ConfigResult::denied()));
	}

	#[test]
	fn approval_truncates_fractional_expiry() {
		let response = ConfigResponse {
			ok: true,
			url: Some(" https://a.example/start ".into()),
			expires: Some(1_700_000_000.9),
		};
		let result = interpret_response(response).unwrap();
		assert!(result.approved);
		assert_eq!(result.content_url.unwrap().as_str(), "https://a.example/start");
		assert_eq!(result.expires_at, Some(1_700_000_000));
	}

	#[test]
	fn approval_without_usable_url_is_a_decode_failure() {
		for url in [None, Some(String::new()), Some("not a url".to_string())] {
			let response = ConfigResponse { ok: true, url, expires: None };
			assert!(matches!(interpret_response(response), Err(ConfigFailure::Decode(_))));
		}
	}

	#[test]
	fn lookup_url_carries_store_key_and_device() {
		let client = HttpAttributionClient::new(
			Some(Url::parse("https://gcdsdk.example/").unwrap()),
			"123456",
			"dev key",
			Duration::from_secs(10),
		)
		.unwrap();
		let url = client.lookup_url("uid-1").unwrap();
		assert_eq!(
			url.as_str(),
			"https://gcdsdk.example/install_data/v4.0/id123456?devkey=dev+key&device_id=uid-1"
		);
	}

	#[test]
	fn unconfigured_enrichment_reports_missing_endpoint() {
		let client = HttpAttributionClient::new(None, "1", "k", Duration::from_secs(1)).unwrap();
		assert!(matches!(client.lookup_url("uid"), Err(RuntimeError::NotConfigured(_))));
	}
}
