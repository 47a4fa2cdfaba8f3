// self
use crate::obs::GrantOutcome;

/// Records a grant outcome via the global metrics recorder (when enabled).
pub fn record_grant_outcome(grant: &'static str, outcome: GrantOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_email_grant_total",
			"grant" => grant,
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (grant, outcome);
	}
}
