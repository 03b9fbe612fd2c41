// self
use token_rotor::{
	_preludet::*,
	resolver::RequestCarriers,
	rotor::{RotorConfig, TokenRotor},
	session::MemorySessions,
	store::{InsertOutcome, RenameOutcome, StoreError, StoreFuture, TokenStore},
	token::{SessionId, TokenBinding, TokenId},
};

/// Store on which every generated id is already taken; no rotation can ever persist.
struct SaturatedStore;
impl TokenStore for SaturatedStore {
	fn find_active<'a>(
		&'a self,
		_: &'a TokenId,
		_: OffsetDateTime,
	) -> StoreFuture<'a, Option<SessionId>> {
		Box::pin(async { Ok(None) })
	}

	fn insert(&self, _: TokenBinding) -> StoreFuture<'_, InsertOutcome> {
		Box::pin(async { Ok(InsertOutcome::IdConflict) })
	}

	fn rename<'a>(&'a self, _: &'a TokenId, _: TokenBinding) -> StoreFuture<'a, RenameOutcome> {
		Box::pin(async { Ok(RenameOutcome::IdConflict) })
	}

	fn delete_expired(&self, _: OffsetDateTime) -> StoreFuture<'_, u64> {
		Box::pin(async { Ok(0) })
	}

	fn ensure_schema(&self) -> StoreFuture<'_, ()> {
		Box::pin(async { Ok(()) })
	}
}

/// Store whose writes and sweeps fail outright, as if the database went away mid-request.
struct OutageStore;
impl OutageStore {
	fn offline() -> StoreError {
		StoreError::Backend { message: "storage offline".into() }
	}
}
impl TokenStore for OutageStore {
	fn find_active<'a>(
		&'a self,
		_: &'a TokenId,
		_: OffsetDateTime,
	) -> StoreFuture<'a, Option<SessionId>> {
		Box::pin(async { Ok(None) })
	}

	fn insert(&self, _: TokenBinding) -> StoreFuture<'_, InsertOutcome> {
		Box::pin(async { Err(Self::offline()) })
	}

	fn rename<'a>(&'a self, _: &'a TokenId, _: TokenBinding) -> StoreFuture<'a, RenameOutcome> {
		Box::pin(async { Err(Self::offline()) })
	}

	fn delete_expired(&self, _: OffsetDateTime) -> StoreFuture<'_, u64> {
		Box::pin(async { Err(Self::offline()) })
	}

	fn ensure_schema(&self) -> StoreFuture<'_, ()> {
		Box::pin(async { Ok(()) })
	}
}

#[tokio::test]
async fn exhausting_the_generation_budget_is_fatal() {
	let rotor = TokenRotor::new(Arc::new(SaturatedStore), Arc::new(MemorySessions::default()))
		.with_config(RotorConfig::default().with_max_id_attempts(3));
	let request = rotor.open(RequestCarriers::none()).await.expect("Open should succeed.");
	let result = rotor.finalize(request).await;

	assert!(matches!(result, Err(Error::TokenIdExhausted { attempts: 3 })));
	assert_eq!(rotor.rotation_metrics.id_conflicts(), 3, "every attempt must burn one id");
	assert_eq!(rotor.rotation_metrics.failures(), 1);
	assert_eq!(rotor.rotation_metrics.issued(), 0);
}

#[tokio::test]
async fn a_dead_backend_surfaces_from_finalize() {
	let rotor = TokenRotor::new(Arc::new(OutageStore), Arc::new(MemorySessions::default()));

	// Open still succeeds: the sweep is best-effort and a fresh request needs no lookup.
	let request = rotor.open(RequestCarriers::none()).await.expect("Open should succeed.");
	let result = rotor.finalize(request).await;

	assert!(matches!(result, Err(Error::Storage(StoreError::Backend { .. }))));
	assert_eq!(rotor.rotation_metrics.failures(), 1);
	assert_eq!(rotor.rotation_metrics.issued(), 0, "no token may be promised without a row");
}
