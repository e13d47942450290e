use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use launchgate::{LaunchDecision, LaunchResolver};
use launchgate_protocol::AttributionPayload;
use launchgate_runtime::{HttpAttributionClient, HttpConfigClient, LaunchRuntime, Remotes, StaticPrompter};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::cli::ResolveArgs;
use crate::context::CliContext;
use crate::output::emit;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveReport {
	decision: LaunchDecision,
	state: launchgate::settings::PersistedLaunchState,
}

fn parse_attribution(raw: &str, device_id: &str) -> anyhow::Result<AttributionPayload> {
	let value: Value = serde_json::from_str(raw).context("--attribution must be valid JSON")?;
	let Value::Object(fields) = value else {
		bail!("--attribution must be a JSON object");
	};
	Ok(AttributionPayload::new(device_id, fields))
}

pub async fn run(ctx: &CliContext, args: ResolveArgs) -> anyhow::Result<()> {
	let config = ctx
		.launch_config()
		.with_context(|| format!("failed to load {}", ctx.config_path().display()))?;
	let attribution = args
		.attribution
		.as_deref()
		.map(|raw| parse_attribution(raw, &args.device_id))
		.transpose()?;

	let settings = ctx.settings();
	if let Some(token) = args.push_token.as_deref() {
		settings.set_push_token(token);
	}

	let remotes = Remotes {
		config: Arc::new(HttpConfigClient::from_config(&config)?),
		enricher: Arc::new(HttpAttributionClient::from_config(&config)?),
		prompter: Arc::new(StaticPrompter(args.notifications.into())),
	};
	let mut runtime = LaunchRuntime::new(LaunchResolver::new(settings.clone(), config), remotes);
	let handle = runtime.handle();
	let mut decisions = runtime.subscribe();

	if let Some(link) = args.deep_link {
		handle.push(json!({ "url": link }))?;
	}
	if args.offline {
		handle.set_online(false)?;
	}
	handle.start()?;
	match attribution {
		Some(payload) => handle.attribution(payload)?,
		None => handle.attribution_failed(args.device_id.as_str(), "no attribution supplied")?,
	}

	let outcome = tokio::time::timeout(Duration::from_secs(args.timeout_secs), async {
		tokio::select! {
			settled = runtime.run_until_settled() => settled.map_err(anyhow::Error::from),
			offline = decisions.wait_for(|decision| *decision == LaunchDecision::Offline) => {
				Ok(offline.map(|decision| decision.clone()).unwrap_or(LaunchDecision::Offline))
			}
		}
	})
	.await
	.context("resolution did not settle in time")?;
	let decision = outcome?;
	debug!(target: "launchgate", %decision, "resolution finished");

	let report = ResolveReport {
		decision,
		state: settings.snapshot(),
	};
	emit(ctx.format, &report, || report.decision.to_string())
}
