//! Strongly typed token and session identifiers.

// std
use std::{borrow::Borrow, ops::Deref};
// crates.io
use rand::Rng;
// self
use crate::_prelude::*;

/// Exact character count of a token id (32 hex digits, 128 bits).
pub const TOKEN_ID_LEN: usize = 32;

const SESSION_ID_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (token, session).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (token, session).
		kind: &'static str,
	},
	/// The identifier does not have the required character count.
	#[error("{kind} identifier must be exactly {expected} characters.")]
	WrongLength {
		/// Kind of identifier (token, session).
		kind: &'static str,
		/// Required character count.
		expected: usize,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (token, session).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
	/// The identifier contains a non-hexadecimal character.
	#[error("{kind} identifier must be hexadecimal.")]
	NotHex {
		/// Kind of identifier (token, session).
		kind: &'static str,
	},
}

/// Rotating opaque token id exposed to clients in place of a session cookie.
///
/// Always exactly [`TOKEN_ID_LEN`] ASCII hex digits. Parsing accepts either case; generation
/// produces lowercase.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenId(String);
impl TokenId {
	/// Validates and wraps a candidate token id.
	pub fn parse(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		if view.len() != TOKEN_ID_LEN {
			return Err(IdentifierError::WrongLength { kind: "Token", expected: TOKEN_ID_LEN });
		}
		if !view.bytes().all(|b| b.is_ascii_hexdigit()) {
			return Err(IdentifierError::NotHex { kind: "Token" });
		}

		Ok(Self(view.to_owned()))
	}

	/// Generates a fresh candidate id from the thread-local CSPRNG.
	///
	/// 128 bits of entropy rendered as 32 lowercase hex digits. Uniqueness is enforced by the
	/// store's primary key, not here—callers retry on insert conflict.
	pub fn generate() -> Self {
		Self(format!("{:032x}", rand::rng().random::<u128>()))
	}

	/// Returns the id as a string slice, suitable for header emission.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Deref for TokenId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for TokenId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for TokenId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<TokenId> for String {
	fn from(value: TokenId) -> Self {
		value.0
	}
}
impl TryFrom<String> for TokenId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(&value)
	}
}
impl FromStr for TokenId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
impl Debug for TokenId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenId({})", self.0)
	}
}
impl Display for TokenId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Internal identifier under which session content is stored; never exposed to clients directly.
///
/// The session collaborator owns allocation, so validation stays loose: non-empty, no whitespace,
/// bounded length.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);
impl SessionId {
	/// Creates a new session identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		if view.is_empty() {
			return Err(IdentifierError::Empty { kind: "Session" });
		}
		if view.chars().any(char::is_whitespace) {
			return Err(IdentifierError::ContainsWhitespace { kind: "Session" });
		}
		if view.len() > SESSION_ID_MAX_LEN {
			return Err(IdentifierError::TooLong { kind: "Session", max: SESSION_ID_MAX_LEN });
		}

		Ok(Self(view.to_owned()))
	}

	/// Generates a 32-hex session id from the thread-local CSPRNG, for backends that do not bring
	/// their own allocation scheme.
	pub fn generate() -> Self {
		Self(format!("{:032x}", rand::rng().random::<u128>()))
	}

	/// Returns the id as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Deref for SessionId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for SessionId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for SessionId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<SessionId> for String {
	fn from(value: SessionId) -> Self {
		value.0
	}
}
impl TryFrom<String> for SessionId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(&value)
	}
}
impl FromStr for SessionId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for SessionId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "SessionId({})", self.0)
	}
}
impl Display for SessionId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn token_ids_accept_both_hex_cases() {
		let lower = "0123456789abcdef0123456789abcdef";
		let upper = "0123456789ABCDEF0123456789ABCDEF";

		assert_eq!(TokenId::parse(lower).expect("Lowercase hex should parse.").as_str(), lower);
		assert_eq!(TokenId::parse(upper).expect("Uppercase hex should parse.").as_str(), upper);
	}

	#[test]
	fn token_ids_reject_malformed_candidates() {
		assert!(TokenId::parse("").is_err());
		assert!(TokenId::parse("0123456789abcdef0123456789abcde").is_err(), "31 chars");
		assert!(TokenId::parse("0123456789abcdef0123456789abcdef0").is_err(), "33 chars");
		assert!(TokenId::parse("0123456789abcdef0123456789abcdeg").is_err(), "non-hex digit");
		assert!(TokenId::parse("0123456789abcdef 123456789abcdef").is_err(), "embedded space");
	}

	#[test]
	fn generated_ids_are_lowercase_hex_of_fixed_length() {
		let id = TokenId::generate();

		assert_eq!(id.as_str().len(), TOKEN_ID_LEN);
		assert!(id.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));

		TokenId::parse(id.as_str()).expect("Generated ids should satisfy their own validation.");
	}

	#[test]
	fn generated_ids_do_not_repeat_over_a_small_sample() {
		let sample: std::collections::HashSet<_> =
			(0..1_000).map(|_| TokenId::generate().as_str().to_owned()).collect();

		assert_eq!(sample.len(), 1_000);
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let id: TokenId = serde_json::from_str("\"0123456789abcdef0123456789abcdef\"")
			.expect("Valid token id should deserialize.");

		assert_eq!(id.as_str(), "0123456789abcdef0123456789abcdef");
		assert!(serde_json::from_str::<TokenId>("\"not-a-token\"").is_err());
		assert!(serde_json::from_str::<SessionId>("\"with space\"").is_err());
	}

	#[test]
	fn session_ids_validate_shape() {
		assert!(SessionId::new("").is_err());
		assert!(SessionId::new("has space").is_err());
		assert!(SessionId::new("a".repeat(129)).is_err());

		SessionId::new("a".repeat(128)).expect("Max-length session id should be accepted.");
	}
}
