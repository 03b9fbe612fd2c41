// self
use crate::obs::{StageKind, StageOutcome};

/// Records a stage outcome via the global metrics recorder (when enabled).
pub fn record_stage_outcome(kind: StageKind, outcome: StageOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"token_rotor_stage_total",
			"stage" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a rotation that lost the conditional-rename race and fell back to an insert.
pub fn record_lost_race() {
	#[cfg(feature = "metrics")]
	metrics::counter!("token_rotor_lost_race_total").increment(1);
}

/// Records a generated token id that collided with an existing binding.
pub fn record_id_conflict() {
	#[cfg(feature = "metrics")]
	metrics::counter!("token_rotor_id_conflict_total").increment(1);
}
