// std
use std::sync::atomic::{AtomicUsize, Ordering};
// crates.io
use oauth2::{
	HttpResponse,
	http::{Method, Request, header::CONTENT_TYPE},
};
use serde_json::{Value, json};
// self
use oauth2_email_grant::{
	_preludet::*,
	auth::{Client, IssuedToken, Scope, ScopeId, TokenId, User, UserId},
	authority::{AuthorityError, ScopeAuthority, TokenAuthority, TokenRequest, UserAuthority},
	error::BoxError,
	event::{GrantEventKind, MemoryEventSink},
	grant::{DeliveryCallback, EmailGrant, EmailValidator},
	http::GrantRequest,
	response::{AcknowledgmentResponse, BearerTokenResponse, ResponseType},
};

const TTL: Duration = Duration::minutes(15);

struct CountingUsers {
	inner: Arc<dyn UserAuthority>,
	calls: AtomicUsize,
}
impl UserAuthority for CountingUsers {
	fn resolve_by_credentials(
		&self,
		username: &str,
		password: &str,
		grant_type: &str,
		client: &Client,
	) -> Result<Option<User>, AuthorityError> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		self.inner.resolve_by_credentials(username, password, grant_type, client)
	}
}

struct CountingTokens {
	inner: Arc<dyn TokenAuthority>,
	issued: AtomicUsize,
}
impl TokenAuthority for CountingTokens {
	fn issue(&self, request: TokenRequest<'_>) -> Result<IssuedToken, AuthorityError> {
		self.issued.fetch_add(1, Ordering::SeqCst);

		self.inner.issue(request)
	}

	fn persist(&self, token: &IssuedToken) -> Result<(), AuthorityError> {
		self.inner.persist(token)
	}

	fn is_revoked(&self, token_id: &TokenId) -> Result<bool, AuthorityError> {
		self.inner.is_revoked(token_id)
	}

	fn revoke(&self, token_id: &TokenId, instant: OffsetDateTime) -> Result<(), AuthorityError> {
		self.inner.revoke(token_id, instant)
	}
}

struct WideningScopes {
	inner: Arc<dyn ScopeAuthority>,
}
impl ScopeAuthority for WideningScopes {
	fn resolve(&self, identifier: &str) -> Result<Option<Scope>, AuthorityError> {
		self.inner.resolve(identifier)
	}

	fn finalize(
		&self,
		mut scopes: Vec<Scope>,
		grant_type: &str,
		_client: &Client,
		user_id: &UserId,
	) -> Result<Vec<Scope>, AuthorityError> {
		assert_eq!(grant_type, EmailGrant::IDENTIFIER);
		assert_eq!(user_id.as_ref(), "fake1_email@example.dev");

		scopes.push(Scope::new(ScopeId::new("email").expect("Scope fixture should be valid.")));

		Ok(scopes)
	}
}

fn handle(grant: &EmailGrant, request: &GrantRequest) -> Result<AcknowledgmentResponse> {
	grant.handle_access_token_request(request, Box::new(AcknowledgmentResponse::new()), TTL)
}

fn assert_invalid_request(result: Result<AcknowledgmentResponse>, parameter: &str) {
	match result {
		Err(Error::InvalidRequest { parameter: actual }) => assert_eq!(actual, parameter),
		other => panic!("Expected invalid_request for `{parameter}`, got {other:?}."),
	}
}

#[test]
fn known_user_receives_acknowledgment_and_delivery() -> color_eyre::Result<()> {
	let fixture = GrantFixture::new();
	let grant = fixture.grant();
	let response = handle(&grant, &fixture.request("user@example.com"))?;
	let rendered = response.render(HttpResponse::new(Vec::new()))?;

	assert_eq!(rendered.status().as_u16(), 200);

	let body: Value = serde_json::from_slice(rendered.body())?;
	let expires_in = body["expires_in"].as_i64().expect("expires_in should be an integer.");

	assert_eq!(body["message"], "Mail with recover link has been sent to provided address");
	assert!((898..=900).contains(&expires_in), "Unexpected expires_in {expires_in}.");

	let deliveries = fixture.deliveries();

	assert_eq!(deliveries.len(), 1);

	let delivered = &deliveries[0];

	assert_eq!(delivered.email, "user@example.com");
	assert_eq!(delivered.client.as_ref(), CLIENT_ID);
	assert_eq!(delivered.user.as_ref(), "user@example.com");
	assert_eq!(delivered.scopes.len(), 1);
	assert_eq!(delivered.scopes[0].identifier(), DEFAULT_SCOPE);
	assert_eq!(response.expires_at(), Some(delivered.token.expires_at));
	assert!(fixture.tokens.get(&delivered.token.id).is_some(), "Token must be persisted.");

	let raw = String::from_utf8(rendered.into_body())?;

	assert!(!raw.contains(delivered.token.secret.expose()));
	assert!(!raw.contains(delivered.token.id.as_ref()));

	Ok(())
}

#[test]
fn json_http_requests_are_handled_end_to_end() -> color_eyre::Result<()> {
	let fixture = GrantFixture::new();
	let http_request = Request::builder()
		.method(Method::POST)
		.uri("https://example.dev/token")
		.header(CONTENT_TYPE, "application/json")
		.body(
			serde_json::to_vec(&json!({
				"grant_type": "custom_email",
				"email": "fake1_email@example.dev",
				"client_id": CLIENT_ID,
				"client_secret": CLIENT_SECRET,
			}))?,
		)?;
	let request = GrantRequest::from_http(&http_request)?;

	handle(&fixture.grant(), &request)?;

	assert_eq!(fixture.deliveries()[0].email, "fake1_email@example.dev");

	Ok(())
}

#[test]
fn unknown_email_fails_with_invalid_credentials() {
	let fixture = GrantFixture::new();
	let events = MemoryEventSink::default();
	let grant = fixture.grant().with_event_sink(Arc::new(events.clone()));
	let err = handle(&grant, &fixture.request("unknown@example.com"))
		.expect_err("Unknown users must be rejected.");

	assert!(matches!(err, Error::InvalidCredentials));
	assert_eq!(err.error_type(), "invalid_grant");
	assert_eq!(events.kinds(), vec![GrantEventKind::UserAuthenticationFailed]);
	assert!(fixture.tokens.is_empty());
	assert!(fixture.deliveries().is_empty());
}

#[test]
fn invalid_clients_fail_before_token_issuance() {
	let fixture = GrantFixture::new();
	let events = MemoryEventSink::default();
	let tokens = Arc::new(CountingTokens {
		inner: Arc::new(fixture.tokens.clone()),
		issued: AtomicUsize::new(0),
	});
	let grant = fixture
		.grant()
		.with_token_authority(tokens.clone())
		.with_event_sink(Arc::new(events.clone()));
	let unknown = GrantRequest::new()
		.with_basic_auth("johndoe", "foobar")
		.expect("Basic auth header should be valid.")
		.with_param("email", "fake1_email@example.dev");
	let wrong_secret = GrantRequest::new()
		.with_basic_auth(CLIENT_ID, "close sesame")
		.expect("Basic auth header should be valid.")
		.with_param("email", "fake1_email@example.dev");

	for request in [unknown, wrong_secret] {
		let err = handle(&grant, &request).expect_err("Invalid clients must be rejected.");

		assert!(matches!(err, Error::InvalidClient { .. }));
		assert_eq!(err.http_status(), 401);
	}

	assert_eq!(tokens.issued.load(Ordering::SeqCst), 0);
	assert_eq!(
		events.kinds(),
		vec![GrantEventKind::ClientAuthenticationFailed, GrantEventKind::ClientAuthenticationFailed]
	);
}

#[test]
fn missing_client_id_is_an_invalid_request() {
	let fixture = GrantFixture::new();

	assert_invalid_request(
		handle(&fixture.grant(), &GrantRequest::new().with_param("email", "user@example.com")),
		"client_id",
	);
}

#[test]
fn absent_non_string_or_empty_email_skips_user_lookup() {
	let fixture = GrantFixture::new();
	let users = Arc::new(CountingUsers {
		inner: Arc::new(fixture.users.clone()),
		calls: AtomicUsize::new(0),
	});
	let grant = EmailGrant::new(users.clone(), fixture.delivery())
		.with_client_authority(Arc::new(fixture.clients.clone()))
		.with_scope_authority(Arc::new(fixture.scopes.clone()))
		.with_token_authority(Arc::new(fixture.tokens.clone()))
		.with_default_scope(DEFAULT_SCOPE)
		.expect("Default scope fixture should be valid.");
	let base = GrantRequest::new()
		.with_basic_auth(CLIENT_ID, CLIENT_SECRET)
		.expect("Basic auth header should be valid.");

	assert_invalid_request(handle(&grant, &base), "email");
	assert_invalid_request(handle(&grant, &base.clone().with_param("email", 1234)), "email");
	assert_invalid_request(handle(&grant, &base.clone().with_param("email", "")), "email");
	assert_invalid_request(handle(&grant, &base.clone().with_param("email", Value::Null)), "email");
	assert_eq!(users.calls.load(Ordering::SeqCst), 0);
	assert!(fixture.deliveries().is_empty());
}

#[test]
fn rejecting_validators_fail_the_request() {
	let fixture = GrantFixture::new();
	let validators = [
		EmailValidator::custom(|email| Ok(email != "fake_blacklisted@example.dev")),
		EmailValidator::custom(|_| Err(BoxError::from("validator backend unavailable"))),
		EmailValidator::custom(|_| panic!("validator crashed")),
	];

	for validator in validators {
		let grant = fixture.grant().with_email_validator(validator);

		assert_invalid_request(
			handle(&grant, &fixture.request("fake_blacklisted@example.dev")),
			"email",
		);
	}

	let mut grant = fixture.grant();

	grant.set_email_validator(Some(EmailValidator::custom(|email| {
		Ok(email.ends_with("@example.dev"))
	})));

	assert!(handle(&grant, &fixture.request("fake2_email@example.dev")).is_ok());
	assert_invalid_request(handle(&grant, &fixture.request("user@example.com")), "email");

	grant.set_email_validator(None);

	assert!(handle(&grant, &fixture.request("user@example.com")).is_ok());
}

#[test]
fn unknown_scopes_fail_with_invalid_scope() {
	let fixture = GrantFixture::new();
	let request = fixture.request("fake1_email@example.dev").with_param("scope", "foobar admin");

	match handle(&fixture.grant(), &request) {
		Err(Error::InvalidScope { scope }) => assert_eq!(scope, "admin"),
		other => panic!("Expected invalid_scope, got {other:?}."),
	}

	assert!(fixture.tokens.is_empty());
}

#[test]
fn finalized_scopes_are_authoritative() -> color_eyre::Result<()> {
	let fixture = GrantFixture::new();
	let grant = fixture.grant().with_scope_authority(Arc::new(WideningScopes {
		inner: Arc::new(fixture.scopes.clone()),
	}));

	handle(&grant, &fixture.request("fake1_email@example.dev").with_param("scope", "profile"))?;

	let deliveries = fixture.deliveries();
	let delivered = &deliveries[0];
	let identifiers =
		delivered.scopes.iter().map(|scope| scope.identifier().to_owned()).collect::<Vec<_>>();

	assert_eq!(identifiers, vec!["profile", "email"]);
	assert!(delivered.token.has_scope("email"));

	Ok(())
}

#[test]
fn delivery_failures_propagate_after_persistence() {
	let fixture = GrantFixture::new();
	let events = MemoryEventSink::default();
	let mut grant = fixture.grant().with_event_sink(Arc::new(events.clone()));

	grant.set_delivery_callback(DeliveryCallback::new(|_| {
		Err(std::io::Error::other("Exception after token issued").into())
	}));

	let err = handle(&grant, &fixture.request("fake1_email@example.dev"))
		.expect_err("Delivery failures must propagate.");
	let Error::Delivery(source) = err else {
		panic!("Delivery failures must keep their own variant.");
	};
	let io = source.downcast_ref::<std::io::Error>().expect("Original error should be kept.");

	assert_eq!(io.to_string(), "Exception after token issued");
	assert_eq!(fixture.tokens.len(), 1, "The token stays persisted after a delivery failure.");
	assert_eq!(events.kinds(), vec![GrantEventKind::AccessTokenIssued]);
}

#[test]
fn bearer_responses_are_replaced_with_acknowledgments() -> color_eyre::Result<()> {
	let fixture = GrantFixture::new();
	let response = fixture.grant().handle_access_token_request(
		&fixture.request("fake1_email@example.dev"),
		Box::new(BearerTokenResponse::new()),
		TTL,
	)?;
	let deliveries = fixture.deliveries();
	let delivered = &deliveries[0];

	assert_eq!(response.expires_at(), Some(delivered.token.expires_at));

	let rendered = response.render(HttpResponse::new(Vec::new()))?;
	let body = String::from_utf8(rendered.into_body())?;

	assert!(body.contains(AcknowledgmentResponse::MESSAGE));
	assert!(!body.contains("access_token"));
	assert!(!body.contains(delivered.token.secret.expose()));

	Ok(())
}

#[test]
fn protocol_errors_render_rfc_payloads() -> color_eyre::Result<()> {
	let fixture = GrantFixture::new();
	let err = handle(&fixture.grant(), &fixture.request(""))
		.expect_err("Empty emails must be rejected.");
	let rendered = err.render(HttpResponse::new(Vec::new()))?;
	let body: Value = serde_json::from_slice(rendered.body())?;

	assert_eq!(rendered.status().as_u16(), 400);
	assert_eq!(body["error"], "invalid_request");
	assert_eq!(body["hint"], "Check the `email` parameter");

	Ok(())
}

#[test]
fn grant_is_shareable_across_threads() {
	let fixture = GrantFixture::new();
	let grant = Arc::new(fixture.grant());
	let handles = ["fake1_email@example.dev", "fake2_email@example.dev"]
		.into_iter()
		.map(|email| {
			let grant = grant.clone();
			let request = fixture.request(email);

			std::thread::spawn(move || handle(&grant, &request).is_ok())
		})
		.collect::<Vec<_>>();

	for handle in handles {
		assert!(handle.join().expect("Worker thread should not panic."));
	}

	assert_eq!(fixture.tokens.len(), 2);
	assert_eq!(fixture.deliveries().len(), 2);
}
