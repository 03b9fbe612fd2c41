//! Crate-level error types shared across the rotor, stores, and collaborators.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public rotor APIs.
///
/// Malformed or absent request tokens are never errors—they route to the fresh-session path.
/// A lost rotation race is recovered locally and never reaches this type either.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token-store failure. When raised from `finalize` this is fatal: the response cannot
	/// honestly promise a token the store refused to persist.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Session-content collaborator failure.
	#[error("{0}")]
	Session(
		#[from]
		#[source]
		crate::session::SessionError,
	),
	/// Every generated token id collided with an existing binding. With 128 bits of entropy this
	/// indicates a broken random source or a corrupted table, not bad luck.
	#[error("Token id generation exhausted after {attempts} attempts.")]
	TokenIdExhausted {
		/// Number of generate-and-persist attempts made before giving up.
		attempts: u32,
	},
}
