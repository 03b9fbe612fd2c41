//! Optional observability helpers for rotor stages.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `token_rotor.stage` with the `stage`
//!   (open/finalize/sweep) and `step` (call site) fields.
//! - Enable `metrics` to increment the `token_rotor_stage_total` counter for every
//!   attempt/success/failure, labeled by `stage` + `outcome`, plus the dedicated
//!   `token_rotor_lost_race_total` and `token_rotor_id_conflict_total` counters.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Request-lifecycle stages observed by the rotor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
	/// Token resolution, lookup, and session binding.
	Open,
	/// Replacement-token generation and persistence.
	Finalize,
	/// Expired-binding garbage collection.
	Sweep,
}
impl StageKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageKind::Open => "open",
			StageKind::Finalize => "finalize",
			StageKind::Sweep => "sweep",
		}
	}
}
impl Display for StageKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a rotor stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
