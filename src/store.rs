//! Storage contracts and built-in store implementations for token bindings.

pub mod db;
pub mod memory;

pub use db::{BindingRow, DatabaseError, DatabaseHandle, DbStoreConfig, DbTokenStore, MemoryDatabase};
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	token::{SessionId, TokenBinding, TokenId},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract over the binding table.
///
/// The store is the sole coordination point between concurrent requests (§ concurrency model):
/// `insert` must fail atomically on a duplicate id and `rename` must be a conditional update
/// keyed on the old id, so two racing rotations of the same token see exactly one winner.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the bound session id iff a binding with that id exists and is active at `now`.
	/// Expired rows must never be returned.
	fn find_active<'a>(
		&'a self,
		token: &'a TokenId,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<SessionId>>;

	/// Persists a brand-new binding; [`InsertOutcome::IdConflict`] signals a primary-key
	/// collision and the caller must regenerate.
	fn insert(&self, binding: TokenBinding) -> StoreFuture<'_, InsertOutcome>;

	/// Atomically replaces the binding whose id is `old` with `replacement`.
	/// [`RenameOutcome::LostRace`] is the zero-rows-affected case: the old binding was already
	/// consumed by a concurrent request or swept—not an error.
	fn rename<'a>(
		&'a self,
		old: &'a TokenId,
		replacement: TokenBinding,
	) -> StoreFuture<'a, RenameOutcome>;

	/// Bulk-deletes every binding with `expires_at <= now`, returning the count removed.
	fn delete_expired(&self, now: OffsetDateTime) -> StoreFuture<'_, u64>;

	/// Idempotently creates the binding table if it is absent.
	fn ensure_schema(&self) -> StoreFuture<'_, ()>;
}

/// Result of an insert attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertOutcome {
	/// The binding was persisted.
	Inserted,
	/// A binding with the same token id already exists; regenerate and retry.
	IdConflict,
}

/// Result of a conditional rename attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenameOutcome {
	/// The old binding was replaced in place.
	Renamed,
	/// No binding matched the old id—a concurrent request already rotated it.
	LostRace,
	/// The replacement id collided with an existing binding; regenerate and retry.
	IdConflict,
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// The binding table is missing and could not be created.
	#[error("Schema failure: {message}.")]
	Schema {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
