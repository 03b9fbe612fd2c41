//! Thread-safe in-memory [`SessionBackend`] for local development and tests.

// self
use crate::{
	_prelude::*,
	session::{SessionBackend, SessionError, SessionFuture},
	token::SessionId,
};

type SessionMap = Arc<RwLock<HashMap<SessionId, SessionEntry>>>;

#[derive(Clone, Debug)]
struct SessionEntry {
	data: HashMap<String, String>,
	touched_at: OffsetDateTime,
}
impl SessionEntry {
	fn new(now: OffsetDateTime) -> Self {
		Self { data: HashMap::new(), touched_at: now }
	}
}

/// In-process session-content store keeping payloads in a map, for tests and demos.
///
/// Allocated ids are 32 lowercase hex digits, matching the `session_id CHAR(32)` column of the
/// reference schema. `gc` evicts sessions by idle age (last open/write; reads do not touch).
#[derive(Clone, Debug, Default)]
pub struct MemorySessions(SessionMap);
impl MemorySessions {
	/// Returns the number of live sessions.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no session is held.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Returns `true` when the backend knows the provided session id.
	pub fn contains(&self, session: &SessionId) -> bool {
		self.0.read().contains_key(session)
	}

	fn allocate_now(map: SessionMap, now: OffsetDateTime) -> SessionId {
		let mut guard = map.write();

		loop {
			let id = SessionId::generate();

			if guard.contains_key(&id) {
				continue;
			}

			guard.insert(id.clone(), SessionEntry::new(now));

			return id;
		}
	}

	fn touch_now(
		map: SessionMap,
		session: SessionId,
		now: OffsetDateTime,
	) -> Result<(), SessionError> {
		match map.write().get_mut(&session) {
			Some(entry) => {
				entry.touched_at = now;

				Ok(())
			},
			None => Err(SessionError::Missing { session: session.as_str().to_owned() }),
		}
	}

	fn read_now(map: SessionMap, session: SessionId, key: &str) -> Option<String> {
		map.read().get(&session).and_then(|entry| entry.data.get(key).cloned())
	}

	fn write_now(
		map: SessionMap,
		session: SessionId,
		key: String,
		value: String,
		now: OffsetDateTime,
	) -> Result<(), SessionError> {
		match map.write().get_mut(&session) {
			Some(entry) => {
				entry.touched_at = now;
				entry.data.insert(key, value);

				Ok(())
			},
			None => Err(SessionError::Missing { session: session.as_str().to_owned() }),
		}
	}

	fn gc_now(map: SessionMap, max_lifetime: Duration, now: OffsetDateTime) -> u64 {
		let mut guard = map.write();
		let before = guard.len();

		guard.retain(|_, entry| now - entry.touched_at <= max_lifetime);

		(before - guard.len()) as u64
	}
}
impl SessionBackend for MemorySessions {
	fn allocate(&self) -> SessionFuture<'_, SessionId> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::allocate_now(map, OffsetDateTime::now_utc())) })
	}

	fn open<'a>(&'a self, session: &'a SessionId) -> SessionFuture<'a, ()> {
		let map = self.0.clone();
		let session = session.to_owned();

		Box::pin(async move { Self::touch_now(map, session, OffsetDateTime::now_utc()) })
	}

	fn read<'a>(
		&'a self,
		session: &'a SessionId,
		key: &'a str,
	) -> SessionFuture<'a, Option<String>> {
		let map = self.0.clone();
		let session = session.to_owned();

		Box::pin(async move { Ok(Self::read_now(map, session, key)) })
	}

	fn write<'a>(
		&'a self,
		session: &'a SessionId,
		key: &'a str,
		value: String,
	) -> SessionFuture<'a, ()> {
		let map = self.0.clone();
		let session = session.to_owned();
		let key = key.to_owned();

		Box::pin(async move { Self::write_now(map, session, key, value, OffsetDateTime::now_utc()) })
	}

	fn destroy<'a>(&'a self, session: &'a SessionId) -> SessionFuture<'a, ()> {
		let map = self.0.clone();
		let session = session.to_owned();

		Box::pin(async move {
			map.write().remove(&session);

			Ok(())
		})
	}

	fn gc(&self, max_lifetime: Duration) -> SessionFuture<'_, u64> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::gc_now(map, max_lifetime, OffsetDateTime::now_utc())) })
	}
}
