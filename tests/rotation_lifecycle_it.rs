// self
use token_rotor::{
	_preludet::*,
	resolver::RequestCarriers,
	rotor::RotorConfig,
	store::TokenStore,
	token::{SessionId, TokenBinding, TokenId},
};

#[tokio::test]
async fn empty_table_end_to_end() {
	let (rotor, store, sessions) = build_test_rotor();

	// Request 1: no token anywhere; a fresh session and token A come back.
	let completed = rotor
		.serve(RequestCarriers::none(), |session| async move {
			session.write("user", "u-1").await.expect("Session write should succeed.");

			session.id().clone()
		})
		.await
		.expect("First request should complete.");
	let token_a = completed.token.token.clone();
	let session_1 = completed.output;

	assert_eq!(completed.token.header().0, "Token");
	assert_eq!(completed.token.header().1, token_a.as_str());
	assert_eq!(store.len(), 1);
	assert!(sessions.contains(&session_1));

	// Request 2 presents A via the query carrier before expiry.
	let query = token_a.as_str().to_owned();
	let completed = rotor
		.serve(RequestCarriers::from_query(&query), |session| async move {
			let user = session.read("user").await.expect("Session read should succeed.");

			(session.id().clone(), user)
		})
		.await
		.expect("Second request should complete.");
	let token_b = completed.token.token.clone();
	let (session_2, user) = completed.output;

	// Same session resumed, content intact, row renamed A -> B.
	assert_eq!(session_2, session_1);
	assert_eq!(user, Some("u-1".into()));
	assert_ne!(token_b, token_a);
	assert_eq!(store.len(), 1, "rotation replaces the row, it never duplicates it");

	let now = OffsetDateTime::now_utc();

	assert!(
		rotor.store.find_active(&token_a, now).await.expect("Lookup should succeed.").is_none(),
		"the consumed token must no longer authenticate"
	);
	assert_eq!(
		rotor.store.find_active(&token_b, now).await.expect("Lookup should succeed."),
		Some(session_1)
	);
}

#[tokio::test]
async fn fresh_requests_issue_never_before_seen_tokens() {
	let (rotor, _, _) = build_test_rotor();
	let mut seen = std::collections::HashSet::new();

	for _ in 0..10 {
		let completed = rotor
			.serve(RequestCarriers::none(), |_| async {})
			.await
			.expect("Fresh request should complete.");

		assert!(seen.insert(completed.token.token.as_str().to_owned()));
	}
}

#[tokio::test]
async fn expired_token_routes_to_the_fresh_session_path() {
	let (rotor, store, _) = build_test_rotor();
	let stale_session = SessionId::new("stale-session").expect("Session fixture should be valid.");
	let expired = TokenId::generate();
	let binding = TokenBinding::new(
		expired.clone(),
		stale_session,
		OffsetDateTime::now_utc() - Duration::seconds(1),
	);

	store.insert(binding).await.expect("Seeding the expired binding should succeed.");

	// Disable the open-time sweep so the expired row itself exercises the lookup gating.
	let rotor = rotor.with_config(RotorConfig::default().with_sweep_on_open(false));
	let request = rotor
		.open(RequestCarriers::from_header(expired.as_str()))
		.await
		.expect("Open should succeed.");

	assert!(!request.is_resumed(), "an expired token must behave exactly like an absent one");
	assert_ne!(request.session().as_str(), "stale-session");

	let issued = rotor.finalize(request).await.expect("Finalize should succeed.");

	assert_ne!(issued.token, expired);
}

#[tokio::test]
async fn stale_and_malformed_candidates_start_fresh_sessions() {
	let (rotor, _, _) = build_test_rotor();

	// Well-formed but never issued.
	let unknown = TokenId::generate();
	let request = rotor
		.open(RequestCarriers::from_query(unknown.as_str()))
		.await
		.expect("Open should succeed.");

	assert!(!request.is_resumed());

	rotor.finalize(request).await.expect("Finalize should succeed.");

	// Malformed in both carriers.
	let request = rotor
		.open(RequestCarriers { query: Some("nope"), header: Some("also-not-a-token") })
		.await
		.expect("Open should succeed.");

	assert!(!request.is_resumed());

	rotor.finalize(request).await.expect("Finalize should succeed.");
}

#[tokio::test]
async fn serve_finalizes_even_when_the_handler_reports_failure() {
	let (rotor, _, _) = build_test_rotor();
	let completed = rotor
		.serve(RequestCarriers::none(), |_| async { Err::<(), &str>("application exploded") })
		.await
		.expect("Serve should still commit the rotation.");

	assert!(completed.output.is_err());
	assert_eq!(rotor.rotation_metrics.issued(), 1, "the failed request still got a token");
}

#[tokio::test]
async fn custom_header_name_flows_into_issued_tokens() {
	let (rotor, _, _) = build_test_rotor();
	let rotor = rotor.with_config(RotorConfig::default().with_header_name("X-Session-Token"));
	let completed = rotor
		.serve(RequestCarriers::none(), |_| async {})
		.await
		.expect("Request should complete.");

	assert_eq!(completed.token.header().0, "X-Session-Token");
}

#[tokio::test]
async fn resumed_requests_expose_the_consumed_token() {
	let (rotor, _, _) = build_test_rotor();
	let first = rotor
		.serve(RequestCarriers::none(), |_| async {})
		.await
		.expect("First request should complete.");
	let token_a = first.token.token.clone();
	let request = rotor
		.open(RequestCarriers::from_header(token_a.as_str()))
		.await
		.expect("Open should succeed.");

	assert!(request.is_resumed());
	assert_eq!(request.resumed_from(), Some(&token_a));

	rotor.finalize(request).await.expect("Finalize should succeed.");
}
