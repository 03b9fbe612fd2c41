//! Per-request token rotation orchestration.
//!
//! [`TokenRotor::open`] resolves the inbound candidate token, validates its binding, and resumes
//! or allocates the session; [`TokenRotor::finalize`] generates the replacement token and
//! persists it exactly once, falling back to an independent insert when a concurrent request
//! already consumed the old id. The per-request state lives in an explicit [`RequestToken`]
//! value threaded between the two steps—the rotor itself holds no mutable request state, the
//! store is the sole coordination point.

mod metrics;

pub use metrics::RotationMetrics;

// self
use crate::{
	_prelude::*,
	gc::{GarbageCollector, GcReport},
	obs::{self, StageKind, StageOutcome, StageSpan},
	resolver::{self, RequestCarriers},
	session::{SessionBackend, SessionError},
	store::{InsertOutcome, RenameOutcome, TokenStore},
	token::{SessionId, TokenBinding, TokenId},
};

/// Tunables for the rotation protocol.
///
/// Defaults match the reference deployment: query parameter `_t`, response/request header
/// `Token`, 1440-second token lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RotorConfig {
	/// Name of the query parameter the host extracts the inbound token from.
	pub query_key: String,
	/// Name of the header carrying the token, inbound and outbound.
	pub header_name: String,
	/// Lifetime granted to every issued binding.
	pub token_timeout: Duration,
	/// Upper bound on generate-and-persist attempts before giving up.
	pub max_id_attempts: u32,
	/// Whether `open` runs a best-effort expired-binding sweep first.
	pub sweep_on_open: bool,
}
impl RotorConfig {
	/// Overrides the token query parameter name (defaults to `_t`).
	pub fn with_query_key(mut self, query_key: impl Into<String>) -> Self {
		self.query_key = query_key.into();

		self
	}

	/// Overrides the token header name (defaults to `Token`).
	pub fn with_header_name(mut self, header_name: impl Into<String>) -> Self {
		self.header_name = header_name.into();

		self
	}

	/// Overrides the binding lifetime (defaults to 1440 seconds).
	pub fn with_token_timeout(mut self, timeout: Duration) -> Self {
		self.token_timeout = if timeout.is_negative() { Duration::ZERO } else { timeout };

		self
	}

	/// Overrides the generation retry bound (defaults to 8, clamped to at least 1).
	pub fn with_max_id_attempts(mut self, attempts: u32) -> Self {
		self.max_id_attempts = attempts.max(1);

		self
	}

	/// Overrides the opportunistic sweep-at-open behavior (defaults to on).
	pub fn with_sweep_on_open(mut self, sweep_on_open: bool) -> Self {
		self.sweep_on_open = sweep_on_open;

		self
	}
}
impl Default for RotorConfig {
	fn default() -> Self {
		Self {
			query_key: "_t".into(),
			header_name: "Token".into(),
			token_timeout: Duration::seconds(1440),
			max_id_attempts: 8,
			sweep_on_open: true,
		}
	}
}

/// Coordinates the per-request token lifecycle against a store and a session collaborator.
#[derive(Clone)]
pub struct TokenRotor {
	/// Binding-table store; the sole coordination point between concurrent requests.
	pub store: Arc<dyn TokenStore>,
	/// Session-content collaborator; the rotor only exchanges session ids with it.
	pub sessions: Arc<dyn SessionBackend>,
	/// Protocol tunables.
	pub config: RotorConfig,
	/// Shared counters for rotation outcomes.
	pub rotation_metrics: Arc<RotationMetrics>,
	gc: GarbageCollector,
}
impl TokenRotor {
	/// Creates a rotor over the provided store and session collaborator with default
	/// configuration.
	pub fn new(store: Arc<dyn TokenStore>, sessions: Arc<dyn SessionBackend>) -> Self {
		let gc = GarbageCollector::new(store.clone());

		Self {
			store,
			sessions,
			config: RotorConfig::default(),
			rotation_metrics: Default::default(),
			gc,
		}
	}

	/// Replaces the rotor configuration.
	pub fn with_config(mut self, config: RotorConfig) -> Self {
		self.config = config;

		self
	}

	/// Resolves the inbound token and binds or allocates the session for this request.
	///
	/// A resolvable, active token resumes its bound session and earmarks the old id for the
	/// conditional rename; anything else—absent, malformed, expired, or unknown—routes to the
	/// fresh-session path. Every `open` must be paired with exactly one
	/// [`finalize`](Self::finalize) on every exit path, or the client ends the request without a
	/// usable token.
	pub async fn open(&self, carriers: RequestCarriers<'_>) -> Result<RequestToken> {
		const KIND: StageKind = StageKind::Open;

		let span = StageSpan::new(KIND, "open");

		obs::record_stage_outcome(KIND, StageOutcome::Attempt);

		let result = span
			.instrument(async move {
				let now = OffsetDateTime::now_utc();

				if self.config.sweep_on_open {
					self.gc.sweep_opportunistic(now).await;
				}

				let resumed = match resolver::resolve(carriers) {
					Some(candidate) => self
						.store
						.find_active(&candidate, now)
						.await?
						.map(|session| (candidate, session)),
					None => None,
				};

				match resumed {
					Some((old, session)) => {
						self.sessions.open(&session).await?;

						Ok(RequestToken { session, rotation: Rotation::Replace { old } })
					},
					None => {
						let session = self.sessions.allocate().await?;

						Ok(RequestToken { session, rotation: Rotation::Fresh })
					},
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_stage_outcome(KIND, StageOutcome::Success),
			Err(_) => obs::record_stage_outcome(KIND, StageOutcome::Failure),
		}

		result
	}

	/// Generates the replacement token, persists its binding exactly once, and returns it for
	/// emission on the response.
	///
	/// Fresh requests insert; resumed requests rename the old row in place. A lost rename race
	/// downgrades to an insert for the same session and is never surfaced. Id collisions
	/// regenerate up to the configured bound. Any remaining persistence failure is fatal: the
	/// response must not promise a token the table does not hold.
	pub async fn finalize(&self, request: RequestToken) -> Result<IssuedToken> {
		const KIND: StageKind = StageKind::Finalize;

		let span = StageSpan::new(KIND, "finalize");

		obs::record_stage_outcome(KIND, StageOutcome::Attempt);
		self.rotation_metrics.record_attempt();

		let result = span
			.instrument(async move {
				let expires_at = OffsetDateTime::now_utc() + self.config.token_timeout;
				let RequestToken { session, rotation } = request;
				let mut old = match rotation {
					Rotation::Replace { old } => Some(old),
					Rotation::Fresh => None,
				};

				for _ in 0..self.config.max_id_attempts {
					let token = TokenId::generate();
					let binding = TokenBinding::new(token.clone(), session.clone(), expires_at);

					if let Some(old_id) = &old {
						match self.store.rename(old_id, binding).await? {
							RenameOutcome::Renamed => return Ok(self.issued(token)),
							RenameOutcome::IdConflict => {
								self.note_id_conflict();

								continue;
							},
							RenameOutcome::LostRace => {
								obs::record_lost_race();
								self.rotation_metrics.record_lost_race();

								// The old row is gone but the session is still valid; keep
								// issuing for it through an independent insert.
								old = None;
							},
						}
					}

					let binding = TokenBinding::new(token.clone(), session.clone(), expires_at);

					match self.store.insert(binding).await? {
						InsertOutcome::Inserted => return Ok(self.issued(token)),
						InsertOutcome::IdConflict => self.note_id_conflict(),
					}
				}

				Err(Error::TokenIdExhausted { attempts: self.config.max_id_attempts })
			})
			.await;

		match &result {
			Ok(_) => {
				obs::record_stage_outcome(KIND, StageOutcome::Success);
				self.rotation_metrics.record_issued();
			},
			Err(_) => {
				obs::record_stage_outcome(KIND, StageOutcome::Failure);
				self.rotation_metrics.record_failure();
			},
		}

		result
	}

	/// Runs a whole request under the rotation protocol with a guaranteed commit.
	///
	/// Opens the request, hands the handler a [`SessionHandle`], then finalizes regardless of
	/// what the handler produced—application failures belong inside `T` (which may itself be a
	/// `Result`) and still receive a fresh token, exactly like any other response.
	pub async fn serve<T, F, Fut>(
		&self,
		carriers: RequestCarriers<'_>,
		handler: F,
	) -> Result<Completed<T>>
	where
		F: FnOnce(SessionHandle) -> Fut,
		Fut: Future<Output = T>,
	{
		let request = self.open(carriers).await?;
		let handle =
			SessionHandle { session: request.session.clone(), backend: self.sessions.clone() };
		let output = handler(handle).await;
		let token = self.finalize(request).await?;

		Ok(Completed { token, output })
	}

	/// Periodic GC hook for the host framework: sweeps expired bindings, then delegates to the
	/// session collaborator's own GC.
	pub async fn gc(&self, max_lifetime: Duration) -> Result<GcReport> {
		let expired_bindings = self.gc.sweep(OffsetDateTime::now_utc()).await?;
		let expired_sessions = self.sessions.gc(max_lifetime).await?;

		Ok(GcReport { expired_bindings, expired_sessions })
	}

	fn issued(&self, token: TokenId) -> IssuedToken {
		IssuedToken { header_name: self.config.header_name.clone(), token }
	}

	fn note_id_conflict(&self) {
		obs::record_id_conflict();
		self.rotation_metrics.record_id_conflict();
	}
}
impl Debug for TokenRotor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRotor").field("config", &self.config).finish()
	}
}

/// Explicit per-request rotation context produced by [`TokenRotor::open`].
///
/// Must be consumed by exactly one [`TokenRotor::finalize`] call before the response completes.
#[must_use = "an opened request must be finalized or the client receives no token"]
#[derive(Clone, Debug)]
pub struct RequestToken {
	session: SessionId,
	rotation: Rotation,
}
impl RequestToken {
	/// Returns the session bound to this request.
	pub fn session(&self) -> &SessionId {
		&self.session
	}

	/// Returns the consumed inbound token when the request resumed an existing session.
	pub fn resumed_from(&self) -> Option<&TokenId> {
		match &self.rotation {
			Rotation::Replace { old } => Some(old),
			Rotation::Fresh => None,
		}
	}

	/// Returns `true` when an active inbound token resumed an existing session.
	pub fn is_resumed(&self) -> bool {
		self.resumed_from().is_some()
	}
}

#[derive(Clone, Debug)]
enum Rotation {
	Fresh,
	Replace { old: TokenId },
}

/// Replacement token produced by [`TokenRotor::finalize`], ready for response emission.
#[must_use = "the issued token must be emitted to the client or the session is orphaned"]
#[derive(Clone, Debug)]
pub struct IssuedToken {
	header_name: String,
	/// The freshly issued token id.
	pub token: TokenId,
}
impl IssuedToken {
	/// Returns the `(name, value)` pair to set as a response header.
	pub fn header(&self) -> (&str, &str) {
		(&self.header_name, self.token.as_str())
	}
}

/// Handler-facing view of the request's session.
#[derive(Clone)]
pub struct SessionHandle {
	session: SessionId,
	backend: Arc<dyn SessionBackend>,
}
impl SessionHandle {
	/// Returns the bound session id.
	pub fn id(&self) -> &SessionId {
		&self.session
	}

	/// Reads a value from the session's content.
	pub async fn read(&self, key: &str) -> Result<Option<String>, SessionError> {
		self.backend.read(&self.session, key).await
	}

	/// Writes a value into the session's content.
	pub async fn write(&self, key: &str, value: impl Into<String>) -> Result<(), SessionError> {
		self.backend.write(&self.session, key, value.into()).await
	}

	/// Destroys the session and its content.
	pub async fn destroy(&self) -> Result<(), SessionError> {
		self.backend.destroy(&self.session).await
	}
}
impl Debug for SessionHandle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionHandle").field("session", &self.session).finish()
	}
}

/// A request completed under [`TokenRotor::serve`].
#[derive(Clone, Debug)]
pub struct Completed<T> {
	/// Replacement token to emit on the response.
	pub token: IssuedToken,
	/// Whatever the handler produced.
	pub output: T,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn config_defaults_match_the_reference_deployment() {
		let config = RotorConfig::default();

		assert_eq!(config.query_key, "_t");
		assert_eq!(config.header_name, "Token");
		assert_eq!(config.token_timeout, Duration::seconds(1440));
		assert!(config.sweep_on_open);
	}

	#[test]
	fn config_setters_clamp_degenerate_values() {
		let config = RotorConfig::default()
			.with_token_timeout(Duration::seconds(-5))
			.with_max_id_attempts(0);

		assert_eq!(config.token_timeout, Duration::ZERO);
		assert_eq!(config.max_id_attempts, 1);
	}
}
