//! Thread-safe in-memory [`TokenStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{InsertOutcome, RenameOutcome, StoreError, StoreFuture, TokenStore},
	token::{SessionId, TokenBinding, TokenId},
};

type BindingMap = Arc<RwLock<HashMap<TokenId, StoredBinding>>>;

#[derive(Clone, Debug)]
struct StoredBinding {
	session: SessionId,
	expires_at: OffsetDateTime,
}

/// Thread-safe store that keeps bindings in-process for tests and demos.
///
/// Rows are keyed by token id exactly like the SQL table's primary key, so insert conflicts and
/// conditional renames behave the way a unique-constraint-backed table would.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(BindingMap);
impl MemoryStore {
	/// Returns the number of bindings currently held, active or not.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when the store holds no bindings at all.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Returns the stored binding for a token id regardless of expiry; test inspection helper.
	pub fn snapshot(&self, token: &TokenId) -> Option<TokenBinding> {
		self.0.read().get(token).map(|stored| {
			TokenBinding::new(token.clone(), stored.session.clone(), stored.expires_at)
		})
	}

	fn find_active_now(map: BindingMap, token: TokenId, now: OffsetDateTime) -> Option<SessionId> {
		map.read()
			.get(&token)
			.filter(|stored| stored.expires_at > now)
			.map(|stored| stored.session.clone())
	}

	fn insert_now(map: BindingMap, binding: TokenBinding) -> InsertOutcome {
		let mut guard = map.write();

		if guard.contains_key(&binding.token) {
			return InsertOutcome::IdConflict;
		}

		guard.insert(
			binding.token,
			StoredBinding { session: binding.session, expires_at: binding.expires_at },
		);

		InsertOutcome::Inserted
	}

	fn rename_now(map: BindingMap, old: TokenId, replacement: TokenBinding) -> RenameOutcome {
		let mut guard = map.write();

		// Conflict check first so a failed rename leaves the old row untouched.
		if replacement.token != old && guard.contains_key(&replacement.token) {
			return RenameOutcome::IdConflict;
		}
		if guard.remove(&old).is_none() {
			return RenameOutcome::LostRace;
		}

		guard.insert(
			replacement.token,
			StoredBinding { session: replacement.session, expires_at: replacement.expires_at },
		);

		RenameOutcome::Renamed
	}

	fn delete_expired_now(map: BindingMap, now: OffsetDateTime) -> u64 {
		let mut guard = map.write();
		let before = guard.len();

		guard.retain(|_, stored| stored.expires_at > now);

		(before - guard.len()) as u64
	}
}
impl TokenStore for MemoryStore {
	fn find_active<'a>(
		&'a self,
		token: &'a TokenId,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<SessionId>> {
		let map = self.0.clone();
		let token = token.to_owned();

		Box::pin(async move { Ok(Self::find_active_now(map, token, now)) })
	}

	fn insert(&self, binding: TokenBinding) -> StoreFuture<'_, InsertOutcome> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::insert_now(map, binding)) })
	}

	fn rename<'a>(
		&'a self,
		old: &'a TokenId,
		replacement: TokenBinding,
	) -> StoreFuture<'a, RenameOutcome> {
		let map = self.0.clone();
		let old = old.to_owned();

		Box::pin(async move { Ok(Self::rename_now(map, old, replacement)) })
	}

	fn delete_expired(&self, now: OffsetDateTime) -> StoreFuture<'_, u64> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::delete_expired_now(map, now)) })
	}

	fn ensure_schema(&self) -> StoreFuture<'_, ()> {
		// Nothing to create for the in-process map.
		Box::pin(async move { Ok::<_, StoreError>(()) })
	}
}
