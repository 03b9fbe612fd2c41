//! Session-content collaborator interface.
//!
//! The rotor only supplies or requests session ids; payload storage stays entirely behind
//! [`SessionBackend`]. Host frameworks adapt their own session machinery to this trait.

pub mod memory;

pub use memory::MemorySessions;

// self
use crate::{_prelude::*, token::SessionId};

/// Boxed future returned by [`SessionBackend`] operations.
pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SessionError>> + 'a + Send>>;

/// Storage contract for session content, keyed by the internal session id.
pub trait SessionBackend
where
	Self: Send + Sync,
{
	/// Allocates a fresh session and returns its id.
	fn allocate(&self) -> SessionFuture<'_, SessionId>;

	/// Opens an existing session ahead of any reads, refreshing its liveness.
	fn open<'a>(&'a self, session: &'a SessionId) -> SessionFuture<'a, ()>;

	/// Reads a value from the session's content.
	fn read<'a>(&'a self, session: &'a SessionId, key: &'a str)
	-> SessionFuture<'a, Option<String>>;

	/// Writes a value into the session's content.
	fn write<'a>(
		&'a self,
		session: &'a SessionId,
		key: &'a str,
		value: String,
	) -> SessionFuture<'a, ()>;

	/// Destroys the session and its content.
	fn destroy<'a>(&'a self, session: &'a SessionId) -> SessionFuture<'a, ()>;

	/// Removes sessions idle for longer than `max_lifetime`, returning the count removed.
	fn gc(&self, max_lifetime: Duration) -> SessionFuture<'_, u64>;
}

/// Error type produced by [`SessionBackend`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum SessionError {
	/// The session id is not known to the backend.
	#[error("Session `{session}` does not exist.")]
	Missing {
		/// The unknown session id.
		session: String,
	},
	/// Backend-level failure for the session engine.
	#[error("Session backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
