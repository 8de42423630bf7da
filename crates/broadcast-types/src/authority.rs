//! Signing authority levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The privilege tier a signature must carry for an operation to be accepted.
///
/// `Posting` is the low-privilege key used for frequent, low-stakes actions.
/// `Active` is required for anything that moves value or changes keys. The
/// ordering is meaningful: a higher level satisfies every lower one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityLevel {
	Posting,
	Active,
}

impl AuthorityLevel {
	/// Returns true if a credential of this level may sign for `required`.
	pub fn satisfies(self, required: AuthorityLevel) -> bool {
		self >= required
	}
}

impl fmt::Display for AuthorityLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AuthorityLevel::Posting => f.write_str("posting"),
			AuthorityLevel::Active => f.write_str("active"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_active_satisfies_posting() {
		assert!(AuthorityLevel::Active.satisfies(AuthorityLevel::Posting));
		assert!(AuthorityLevel::Active.satisfies(AuthorityLevel::Active));
		assert!(AuthorityLevel::Posting.satisfies(AuthorityLevel::Posting));
		assert!(!AuthorityLevel::Posting.satisfies(AuthorityLevel::Active));
	}
}
