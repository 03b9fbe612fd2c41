//! Token-to-session binding records and lifecycle helpers.

// self
use crate::{
	_prelude::*,
	token::id::{SessionId, TokenId},
};

/// Lifecycle status of a binding at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingStatus {
	/// The binding may still resume its session.
	Active,
	/// The binding is past its expiry and is garbage.
	Expired,
}

/// The (token id → session id, expiry) record persisted in the binding table.
///
/// The token id is the table's primary key; under normal operation exactly one active binding
/// exists per session, because rotation replaces rows instead of adding them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBinding {
	/// Public rotating token id.
	pub token: TokenId,
	/// Internal session identifier the token resolves to.
	pub session: SessionId,
	/// Absolute instant after which the binding no longer authenticates.
	pub expires_at: OffsetDateTime,
}
impl TokenBinding {
	/// Creates a binding for the provided token/session pair.
	pub fn new(token: TokenId, session: SessionId, expires_at: OffsetDateTime) -> Self {
		Self { token, session, expires_at }
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> BindingStatus {
		if self.expires_at > instant { BindingStatus::Active } else { BindingStatus::Expired }
	}

	/// Returns `true` iff the binding is active (`expires_at > instant`).
	pub fn is_active_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), BindingStatus::Active)
	}

	/// Returns `true` iff the binding is past its expiry at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), BindingStatus::Expired)
	}
}
