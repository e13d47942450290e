//! HTTP collaborators against local axum servers.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use launchgate::ConfigFailure;
use launchgate_protocol::{AttributionPayload, ConfigRequest, DeviceMetadata, PLATFORM_IOS};
use launchgate_runtime::{AttributionEnricher, ConfigSource, HttpAttributionClient, HttpConfigClient, RuntimeError};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

async fn serve(app: Router) -> SocketAddr {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});
	addr
}

fn request() -> ConfigRequest {
	let Value::Object(fields) = json!({ "af_status": "Non-organic", "campaign": "spring" }) else {
		unreachable!()
	};
	ConfigRequest::new(
		&AttributionPayload::new("uid-1", fields),
		DeviceMetadata {
			af_id: "uid-1".into(),
			bundle_id: "com.example.app".into(),
			os: PLATFORM_IOS.into(),
			store_id: "123456".into(),
			locale: "en".into(),
			push_token: "tok".into(),
			firebase_project_id: "proj".into(),
		},
	)
}

fn config_client(addr: SocketAddr, timeout: Duration) -> HttpConfigClient {
	let endpoint = Url::parse(&format!("http://{addr}/config.php")).unwrap();
	HttpConfigClient::new(Some(endpoint), timeout).unwrap()
}

async fn config_server(status: StatusCode, body: &'static str) -> SocketAddr {
	serve(Router::new().route("/config.php", post(move || async move { (status, body) }))).await
}

#[tokio::test]
async fn approved_response_posts_merged_body() {
	let seen = Arc::new(Mutex::new(None::<Value>));
	let captured = Arc::clone(&seen);
	let app = Router::new().route(
		"/config.php",
		post(move |Json(body): Json<Value>| {
			let captured = Arc::clone(&captured);
			async move {
				*captured.lock().unwrap() = Some(body);
				Json(json!({ "ok": true, "url": "https://content.example/start", "expires": 1_800_000_000 }))
			}
		}),
	);
	let addr = serve(app).await;

	let result = config_client(addr, Duration::from_secs(5)).fetch_config(&request()).await.unwrap();
	assert!(result.approved);
	assert_eq!(result.content_url.unwrap().as_str(), "https://content.example/start");
	assert_eq!(result.expires_at, Some(1_800_000_000));

	let body = seen.lock().unwrap().clone().expect("server should receive a JSON body");
	assert_eq!(body["campaign"], "spring");
	assert_eq!(body["os"], "iOS");
	assert_eq!(body["store_id"], "123456");
	assert_eq!(body["push_token"], "tok");
}

#[tokio::test]
async fn denial_is_not_a_failure() {
	let addr = config_server(StatusCode::OK, r#"{"ok":false,"reason":"geo"}"#).await;
	let result = config_client(addr, Duration::from_secs(5)).fetch_config(&request()).await.unwrap();
	assert!(!result.approved);
	assert!(result.content_url.is_none());
}

#[tokio::test]
async fn server_error_maps_to_status_failure() {
	let addr = config_server(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;
	let err = config_client(addr, Duration::from_secs(5)).fetch_config(&request()).await.unwrap_err();
	assert_eq!(err, ConfigFailure::Status(500));
}

#[tokio::test]
async fn undecodable_body_maps_to_decode_failure() {
	let addr = config_server(StatusCode::OK, "<html>maintenance</html>").await;
	let err = config_client(addr, Duration::from_secs(5)).fetch_config(&request()).await.unwrap_err();
	assert!(matches!(err, ConfigFailure::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_server_maps_to_transport_failure() {
	let app = Router::new().route(
		"/config.php",
		post(|| async {
			tokio::time::sleep(Duration::from_secs(5)).await;
			"late"
		}),
	);
	let addr = serve(app).await;
	let err = config_client(addr, Duration::from_millis(200))
		.fetch_config(&request())
		.await
		.unwrap_err();
	assert!(matches!(err, ConfigFailure::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn missing_endpoint_is_a_request_failure() {
	let client = HttpConfigClient::new(None, Duration::from_secs(1)).unwrap();
	let err = client.fetch_config(&request()).await.unwrap_err();
	assert!(matches!(err, ConfigFailure::Request(_)));
}

#[tokio::test]
async fn enrichment_sends_key_device_and_accept_header() {
	let app = Router::new().route(
		"/install_data/v4.0/id123456",
		get(|Query(params): Query<HashMap<String, String>>, headers: HeaderMap| async move {
			let accept = headers.get("accept").and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
			Json(json!({
				"devkey": params.get("devkey"),
				"device_id": params.get("device_id"),
				"accept": accept,
				"af_status": "Organic",
				"media_source": "organic_search"
			}))
		}),
	);
	let addr = serve(app).await;
	let client = HttpAttributionClient::new(
		Some(Url::parse(&format!("http://{addr}/")).unwrap()),
		"123456",
		"secret",
		Duration::from_secs(10),
	)
	.unwrap();

	let fields = client.enrich("uid-9").await.unwrap();
	assert_eq!(fields["devkey"], "secret");
	assert_eq!(fields["device_id"], "uid-9");
	assert_eq!(fields["accept"], "application/json");
	assert_eq!(fields["media_source"], "organic_search");
}

#[tokio::test]
async fn enrichment_rejects_non_object_bodies_and_errors() {
	let app = Router::new().route("/install_data/v4.0/id1", get(|| async { Json(json!([1, 2, 3])) }));
	let addr = serve(app).await;
	let base = Some(Url::parse(&format!("http://{addr}/")).unwrap());

	let client = HttpAttributionClient::new(base.clone(), "1", "k", Duration::from_secs(10)).unwrap();
	assert!(matches!(client.enrich("uid").await, Err(RuntimeError::Decode(_))));

	let missing = HttpAttributionClient::new(base, "404", "k", Duration::from_secs(10)).unwrap();
	assert!(matches!(missing.enrich("uid").await, Err(RuntimeError::Http(_))));
}
