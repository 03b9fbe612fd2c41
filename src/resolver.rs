//! Candidate-token extraction from the two request carriers.

// self
use crate::token::TokenId;

/// Raw carrier values extracted from an inbound request by the host framework.
///
/// The crate never touches the request itself; the host pulls the configured query parameter and
/// header (see [`RotorConfig`](crate::rotor::RotorConfig)) and hands the values over as-is.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestCarriers<'a> {
	/// Value of the token query parameter, if present.
	pub query: Option<&'a str>,
	/// Value of the token request header, if present.
	pub header: Option<&'a str>,
}
impl<'a> RequestCarriers<'a> {
	/// Carriers with neither value present.
	pub fn none() -> Self {
		Self::default()
	}

	/// Carriers with only the query parameter set.
	pub fn from_query(value: &'a str) -> Self {
		Self { query: Some(value), header: None }
	}

	/// Carriers with only the header set.
	pub fn from_header(value: &'a str) -> Self {
		Self { query: None, header: Some(value) }
	}
}

/// Returns the first carrier value that is a well-formed 32-hex token id, query parameter first.
///
/// A malformed query value falls through to the header; malformed or absent values are treated
/// identically and are never an error.
pub fn resolve(carriers: RequestCarriers<'_>) -> Option<TokenId> {
	carriers
		.query
		.and_then(|value| TokenId::parse(value).ok())
		.or_else(|| carriers.header.and_then(|value| TokenId::parse(value).ok()))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const QUERY_ID: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
	const HEADER_ID: &str = "BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";

	#[test]
	fn query_wins_over_header() {
		let carriers = RequestCarriers { query: Some(QUERY_ID), header: Some(HEADER_ID) };
		let resolved = resolve(carriers).expect("Well-formed query value should resolve.");

		assert_eq!(resolved.as_str(), QUERY_ID);
	}

	#[test]
	fn malformed_query_falls_through_to_header() {
		let carriers = RequestCarriers { query: Some("zz-not-hex"), header: Some(HEADER_ID) };
		let resolved = resolve(carriers).expect("Header should back up a malformed query value.");

		assert_eq!(resolved.as_str(), HEADER_ID);
	}

	#[test]
	fn malformed_values_resolve_to_none() {
		assert!(resolve(RequestCarriers::none()).is_none());
		assert!(resolve(RequestCarriers::from_query("short")).is_none());
		assert!(resolve(RequestCarriers::from_header(&"a".repeat(33))).is_none());
		assert!(
			resolve(RequestCarriers::from_query("0123456789abcdef0123456789abcdeg")).is_none(),
			"a single non-hex digit rejects the candidate"
		);
	}

	#[test]
	fn each_carrier_resolves_on_its_own() {
		assert!(resolve(RequestCarriers::from_query(QUERY_ID)).is_some());
		assert!(resolve(RequestCarriers::from_header(HEADER_ID)).is_some());
	}
}
