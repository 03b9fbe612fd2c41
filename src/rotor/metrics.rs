// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for rotation outcomes.
#[derive(Debug, Default)]
pub struct RotationMetrics {
	attempts: AtomicU64,
	issued: AtomicU64,
	lost_races: AtomicU64,
	id_conflicts: AtomicU64,
	failures: AtomicU64,
}
impl RotationMetrics {
	/// Returns the total number of finalize attempts.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of tokens successfully issued.
	pub fn issued(&self) -> u64 {
		self.issued.load(Ordering::Relaxed)
	}

	/// Returns the number of rotations that lost the rename race and fell back to an insert.
	pub fn lost_races(&self) -> u64 {
		self.lost_races.load(Ordering::Relaxed)
	}

	/// Returns the number of generated ids discarded because they collided with existing rows.
	pub fn id_conflicts(&self) -> u64 {
		self.id_conflicts.load(Ordering::Relaxed)
	}

	/// Returns the number of finalize calls that failed fatally.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_issued(&self) {
		self.issued.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_lost_race(&self) {
		self.lost_races.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_id_conflict(&self) {
		self.id_conflicts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
