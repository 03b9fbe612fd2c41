//! Expired-binding garbage collection.

// self
use crate::{
	_prelude::*,
	obs::{self, StageKind, StageOutcome, StageSpan},
	store::{StoreError, TokenStore},
};

/// Deletes bindings past their expiry.
///
/// Runs in two modes: best-effort at session-open time (failures are logged and swallowed—the
/// DB store's lazy schema creation handles a missing table) and on demand from the host
/// framework's periodic session-GC hook via [`TokenRotor::gc`](crate::rotor::TokenRotor::gc).
/// Sweeps may run concurrently with live rotations; they only touch rows already past expiry.
#[derive(Clone)]
pub struct GarbageCollector {
	store: Arc<dyn TokenStore>,
}
impl GarbageCollector {
	/// Creates a collector over the provided store.
	pub fn new(store: Arc<dyn TokenStore>) -> Self {
		Self { store }
	}

	/// Deletes every binding with `expires_at <= now`, returning the count removed.
	pub async fn sweep(&self, now: OffsetDateTime) -> Result<u64, StoreError> {
		const KIND: StageKind = StageKind::Sweep;

		let span = StageSpan::new(KIND, "sweep");

		obs::record_stage_outcome(KIND, StageOutcome::Attempt);

		let result = span.instrument(self.store.delete_expired(now)).await;

		match &result {
			Ok(_) => obs::record_stage_outcome(KIND, StageOutcome::Success),
			Err(_) => obs::record_stage_outcome(KIND, StageOutcome::Failure),
		}

		result
	}

	/// Best-effort sweep used at session-open time; failures are logged, never propagated.
	pub async fn sweep_opportunistic(&self, now: OffsetDateTime) {
		if let Err(error) = self.sweep(now).await {
			obs::warn_sweep_failure(&error);
		}
	}
}
impl Debug for GarbageCollector {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("GarbageCollector(..)")
	}
}

/// Counts reported by the periodic GC hook.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcReport {
	/// Expired token bindings removed.
	pub expired_bindings: u64,
	/// Idle sessions removed by the session collaborator.
	pub expired_sessions: u64,
}
