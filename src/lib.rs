//! Rotating single-use session tokens for cookie-less clients—CAS-backed bindings, pluggable
//! stores, and opportunistic garbage collection in one crate built for production.
//!
//! Each request presents the token issued by the previous response (query parameter `_t` or the
//! `Token` header), the bound server-side session is resumed, and a brand-new token is persisted
//! and emitted before the response completes. Concurrent reuse of the same token is resolved with
//! a conditional rename keyed on the old id: exactly one request wins the rename, the loser falls
//! back to an independent insert for the same session.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod error;
pub mod gc;
pub mod obs;
pub mod resolver;
pub mod rotor;
pub mod session;
pub mod store;
pub mod token;
// Unit tests link the `test`-featured copy of this crate only transitively.
#[cfg(test)]
use token_rotor as _;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixtures for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		rotor::TokenRotor,
		session::{MemorySessions, SessionBackend},
		store::{MemoryStore, TokenStore},
	};

	/// Constructs a [`TokenRotor`] backed by in-memory token and session backends, returning the
	/// backends so tests can inspect them directly.
	pub fn build_test_rotor() -> (TokenRotor, Arc<MemoryStore>, Arc<MemorySessions>) {
		let store_backend = Arc::new(MemoryStore::default());
		let session_backend = Arc::new(MemorySessions::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let sessions: Arc<dyn SessionBackend> = session_backend.clone();
		let rotor = TokenRotor::new(store, sessions);

		(rotor, store_backend, session_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}
