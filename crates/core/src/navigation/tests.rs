use launchgate_protocol::CookieRecord;

use super::fake::{FakeHost, FakeSurface, SharedLog};
use super::*;
use crate::config::NavigationConfig;
use crate::cookies::CookieJarSync;
use crate::settings::LaunchSettings;

fn url(raw: &str) -> Url {
	Url::parse(raw).unwrap()
}

struct Fixture {
	session: NavigationSession<FakeHost>,
	host: FakeHost,
	primary: SharedLog,
	settings: LaunchSettings,
}

fn fixture_with(config: NavigationConfig) -> Fixture {
	let settings = LaunchSettings::in_memory();
	let (primary, log) = FakeSurface::new(SurfaceId::PRIMARY);
	let host = FakeHost::new();
	let session = NavigationSession::new(Box::new(primary), host.clone(), CookieJarSync::new(settings.clone()), &config);
	Fixture {
		session,
		host,
		primary: log,
		settings,
	}
}

fn fixture() -> Fixture {
	fixture_with(NavigationConfig::default())
}

#[test]
fn three_spawns_then_three_dismissals_empty_the_stack() {
	let mut f = fixture();
	f.session.load_primary(&url("https://content.example/"));

	let handles: Vec<_> = (0..3)
		.map(|i| {
			f.session
				.spawn_child(NewWindowRequest::new(SurfaceId::PRIMARY, format!("https://popup{i}.example/")))
				.unwrap()
		})
		.collect();
	assert_eq!(f.session.child_ids(), handles.iter().map(|h| h.id()).collect::<Vec<_>>());

	for handle in handles.iter().rev() {
		assert_eq!(f.session.dismiss_top_child(), Some(handle.id()));
		assert!(f.host.child_log(handle.id()).unwrap().borrow().closed);
	}
	assert_eq!(f.session.children_len(), 0);
	assert_eq!(f.session.dismiss_top_child(), None);

	let primary = f.primary.borrow();
	assert!(!primary.closed);
	assert_eq!(primary.current.as_ref().map(Url::as_str), Some("https://content.example/"));
}

#[test]
fn child_navigates_only_for_real_addresses() {
	let mut f = fixture();

	let real = f.session.spawn_child(NewWindowRequest::new(SurfaceId::PRIMARY, "https://pay.example/checkout")).unwrap();
	let blank = f.session.spawn_child(NewWindowRequest::new(SurfaceId::PRIMARY, "about:blank")).unwrap();
	let empty = f
		.session
		.spawn_child(NewWindowRequest {
			opener: real.id(),
			url: None,
			targets_existing_frame: false,
		})
		.unwrap();

	assert_eq!(f.host.child_log(real.id()).unwrap().borrow().loads.len(), 1);
	assert!(f.host.child_log(blank.id()).unwrap().borrow().loads.is_empty());
	assert!(f.host.child_log(empty.id()).unwrap().borrow().loads.is_empty());
	assert_eq!(f.session.phase(real.id()), Some(SurfacePhase::Loading));
	assert_eq!(f.session.phase(blank.id()), Some(SurfacePhase::Idle));
	assert_eq!(f.host.created()[2], (empty.id(), real.id()));
}

#[test]
fn spawn_declines_existing_frame_targets_and_host_refusals() {
	let mut f = fixture();
	let mut request = NewWindowRequest::new(SurfaceId::PRIMARY, "https://frame.example/");
	request.targets_existing_frame = true;
	assert_eq!(f.session.spawn_child(request), None);

	f.host.refuse_children(true);
	assert_eq!(f.session.spawn_child(NewWindowRequest::new(SurfaceId::PRIMARY, "https://x.example/")), None);
	assert_eq!(f.session.children_len(), 0);
	assert!(f.host.created().is_empty());
}

#[test]
fn children_inherit_persisted_cookies() {
	let mut f = fixture();
	f.primary
		.borrow_mut()
		.cookies
		.insert(("shop.example".into(), "sid".into()), CookieRecord::new("shop.example", "sid", "abc"));
	f.session.load_primary(&url("https://shop.example/"));
	f.session.on_load_finished(SurfaceId::PRIMARY);

	let child = f.session.spawn_child(NewWindowRequest::new(SurfaceId::PRIMARY, "https://shop.example/pay")).unwrap();
	let log = f.host.child_log(child.id()).unwrap();
	assert_eq!(log.borrow().cookies.len(), 1);
}

#[test]
fn redirect_breaker_trips_past_ceiling() {
	let mut f = fixture_with(NavigationConfig {
		redirect_ceiling: 3,
		..NavigationConfig::default()
	});
	f.session.load_primary(&url("https://good.example/"));
	f.session.on_load_finished(SurfaceId::PRIMARY);
	f.session.load_primary(&url("https://loop.example/"));

	for expected in 1..=3 {
		assert_eq!(
			f.session.on_server_redirect(SurfaceId::PRIMARY),
			Some(GuardVerdict::Continue { consecutive: expected })
		);
	}
	// Continue records the current address, which is the loop target here.
	f.session.on_external_scheme_request(SurfaceId::PRIMARY, &url("https://good.example/"));

	let verdict = f.session.on_server_redirect(SurfaceId::PRIMARY).unwrap();
	assert_eq!(
		verdict,
		GuardVerdict::Tripped {
			recover_to: Some(url("https://good.example/"))
		}
	);
	let log = f.primary.borrow();
	assert_eq!(log.stops, 1);
	assert_eq!(log.loads.last(), Some(&url("https://good.example/")));
	assert_eq!(f.session.guard(SurfaceId::PRIMARY).unwrap().consecutive_redirects(), 0);
	assert_eq!(f.session.phase(SurfaceId::PRIMARY), Some(SurfacePhase::Loading));
}

#[test]
fn breaker_without_recovery_target_fails_the_surface() {
	let mut f = fixture_with(NavigationConfig {
		redirect_ceiling: 0,
		..NavigationConfig::default()
	});
	assert_eq!(
		f.session.on_server_redirect(SurfaceId::PRIMARY),
		Some(GuardVerdict::Tripped { recover_to: None })
	);
	assert_eq!(f.session.phase(SurfaceId::PRIMARY), Some(SurfacePhase::Failed));
	assert_eq!(f.primary.borrow().stops, 1);
}

#[test]
fn redirects_persist_cookies() {
	let mut f = fixture();
	f.session.load_primary(&url("https://auth.example/"));
	f.primary
		.borrow_mut()
		.cookies
		.insert(("auth.example".into(), "t".into()), CookieRecord::new("auth.example", "t", "1"));

	f.session.on_server_redirect(SurfaceId::PRIMARY);
	let stored = f.settings.stored_cookies().unwrap();
	assert_eq!(stored["auth.example"]["t"]["value"], "1");
}

#[test]
fn load_completion_resets_redirect_count() {
	let mut f = fixture();
	f.session.load_primary(&url("https://a.example/"));
	f.session.on_server_redirect(SurfaceId::PRIMARY);
	f.session.on_server_redirect(SurfaceId::PRIMARY);
	f.session.on_load_finished(SurfaceId::PRIMARY);

	let guard = f.session.guard(SurfaceId::PRIMARY).unwrap();
	assert_eq!(guard.consecutive_redirects(), 0);
	assert_eq!(guard.last_known_good(), Some(&url("https://a.example/")));
	assert_eq!(f.session.phase(SurfaceId::PRIMARY), Some(SurfacePhase::Loaded));
}

#[test]
fn too_many_redirects_failure_recovers_last_known_good() {
	let mut f = fixture();
	f.session.load_primary(&url("https://home.example/"));
	f.session.on_load_finished(SurfaceId::PRIMARY);

	let outcome = f.session.on_provisional_load_failure(SurfaceId::PRIMARY, NavigationError::TooManyRedirects);
	assert_eq!(outcome, FailureOutcome::Recovered(url("https://home.example/")));
	assert_eq!(f.session.phase(SurfaceId::PRIMARY), Some(SurfacePhase::Loading));
	assert_eq!(f.primary.borrow().loads.len(), 2);
}

#[test]
fn other_failures_are_reported_without_retry() {
	let mut f = fixture();
	f.session.load_primary(&url("https://home.example/"));
	f.session.on_load_finished(SurfaceId::PRIMARY);

	let error = NavigationError::Network("offline".into());
	assert_eq!(
		f.session.on_provisional_load_failure(SurfaceId::PRIMARY, error.clone()),
		FailureOutcome::Reported(error)
	);
	assert_eq!(f.session.phase(SurfaceId::PRIMARY), Some(SurfacePhase::Failed));
	assert_eq!(f.primary.borrow().loads.len(), 1);

	let fresh = fixture().session.on_provisional_load_failure(SurfaceId::PRIMARY, NavigationError::TooManyRedirects);
	assert_eq!(fresh, FailureOutcome::Reported(NavigationError::TooManyRedirects));
}

#[test]
fn content_adjustment_runs_once_per_navigation() {
	let mut f = fixture();
	f.session.load_primary(&url("https://a.example/"));
	f.session.on_load_finished(SurfaceId::PRIMARY);
	f.session.on_load_finished(SurfaceId::PRIMARY);
	assert_eq!(f.primary.borrow().adjustments, 1);

	f.session.on_load_started(SurfaceId::PRIMARY);
	f.session.on_load_finished(SurfaceId::PRIMARY);
	assert_eq!(f.primary.borrow().adjustments, 2);
}

#[test]
fn adjustment_failure_is_not_propagated() {
	let mut f = fixture();
	f.primary.borrow_mut().fail_adjustment = true;
	f.session.load_primary(&url("https://a.example/"));
	assert!(f.session.on_load_finished(SurfaceId::PRIMARY));
	assert_eq!(f.session.phase(SurfaceId::PRIMARY), Some(SurfacePhase::Loaded));
}

#[test]
fn back_dismisses_child_and_reloads_primary() {
	let mut f = fixture();
	f.session.load_primary(&url("https://a.example/"));
	let child = f.session.spawn_child(NewWindowRequest::new(SurfaceId::PRIMARY, "https://b.example/")).unwrap();

	let outcome = f.session.handle_back_navigation(Some(&url("https://a.example/next")));
	assert_eq!(
		outcome,
		BackOutcome::DismissedChild {
			child: child.id(),
			reloaded: Some(url("https://a.example/next"))
		}
	);
	assert_eq!(f.primary.borrow().current, Some(url("https://a.example/next")));
	assert_eq!(f.session.children_len(), 0);
}

#[test]
fn back_steps_primary_history_when_no_children() {
	let mut f = fixture();
	assert_eq!(f.session.handle_back_navigation(None), BackOutcome::Ignored);

	f.session.load_primary(&url("https://a.example/"));
	f.session.load_primary(&url("https://a.example/2"));
	assert_eq!(f.session.handle_back_navigation(None), BackOutcome::SteppedBack);
	assert_eq!(f.primary.borrow().current, Some(url("https://a.example/")));
}

#[test]
fn non_web_schemes_open_externally() {
	let mut f = fixture();
	assert_eq!(
		f.session.on_external_scheme_request(SurfaceId::PRIMARY, &url("https://a.example/x")),
		NavigationPolicy::Allow
	);
	assert_eq!(
		f.session.guard(SurfaceId::PRIMARY).unwrap().last_known_good(),
		Some(&url("https://a.example/x"))
	);
	assert_eq!(
		f.session.on_external_scheme_request(SurfaceId::PRIMARY, &url("about:blank")),
		NavigationPolicy::Allow
	);
	assert_eq!(
		f.session.on_external_scheme_request(SurfaceId::PRIMARY, &url("tel:+15550100")),
		NavigationPolicy::Cancel
	);
	assert_eq!(
		f.session.on_external_scheme_request(SurfaceId::PRIMARY, &url("itms-apps://apps.apple.com/app/id1")),
		NavigationPolicy::Cancel
	);
	assert_eq!(f.host.external_opens().len(), 2);
}

#[test]
fn trust_policy_governs_server_trust_only() {
	let f = fixture();
	let server = AuthChallenge {
		kind: ChallengeKind::ServerTrust,
		host: "a.example".into(),
	};
	let basic = AuthChallenge {
		kind: ChallengeKind::HttpBasic,
		host: "a.example".into(),
	};
	assert_eq!(f.session.authenticate_server_trust(&server), ChallengeDisposition::AcceptPresentedTrust);
	assert_eq!(f.session.authenticate_server_trust(&basic), ChallengeDisposition::PerformDefaultHandling);

	let strict = fixture_with(NavigationConfig {
		trust_policy: TrustPolicy::PlatformDefault,
		..NavigationConfig::default()
	});
	assert_eq!(strict.session.authenticate_server_trust(&server), ChallengeDisposition::PerformDefaultHandling);
}

#[test]
fn events_drive_the_same_operations() {
	let mut f = fixture();
	f.session.load_primary(&url("https://a.example/"));

	let opened = f
		.session
		.handle_event(SurfaceEvent::NewWindow(NewWindowRequest::new(SurfaceId::PRIMARY, "https://b.example/")));
	let EventOutcome::ChildOpened(child) = opened else {
		panic!("expected a child, got {opened:?}");
	};
	assert_eq!(f.session.handle_event(SurfaceEvent::LoadFinished(child.id())), EventOutcome::Handled);
	assert_eq!(f.session.handle_event(SurfaceEvent::CloseRequested(child.id())), EventOutcome::Handled);
	assert_eq!(f.session.children_len(), 0);
	assert_eq!(
		f.session.handle_event(SurfaceEvent::LoadStarted(child.id())),
		EventOutcome::UnknownSurface(child.id())
	);
	assert_eq!(
		f.session.handle_event(SurfaceEvent::Back { active_url: None }),
		EventOutcome::Back(BackOutcome::Ignored)
	);
}

#[test]
fn session_restores_cookies_into_primary() {
	let settings = LaunchSettings::in_memory();
	let (mut seed, _) = FakeSurface::new(SurfaceId(99));
	seed.set_cookie(CookieRecord::new("a.example", "k", "v")).unwrap();
	CookieJarSync::new(settings.clone()).export_domain_cookies(&seed);

	let (primary, log) = FakeSurface::new(SurfaceId::PRIMARY);
	let _session = NavigationSession::new(
		Box::new(primary),
		FakeHost::new(),
		CookieJarSync::new(settings),
		&NavigationConfig::default(),
	);
	assert_eq!(log.borrow().cookies.len(), 1);
}
