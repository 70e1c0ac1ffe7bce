//! Typed identifiers for type-safe entity references.
//!
//! Both identifiers map onto Postgres `integer` columns. Wrapping them keeps an
//! account number from being passed where a transaction record id is expected.

use serde::{Deserialize, Serialize};

/// Macro to generate typed integer identifier wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl $name {
            /// Creates an identifier from its raw integer value.
            #[must_use]
            pub const fn new(value: i32) -> Self {
                Self(value)
            }

            /// Returns the raw integer value.
            #[must_use]
            pub const fn into_inner(self) -> i32 {
                self.0
            }
        }

        impl From<i32> for $name {
            fn from(value: i32) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

typed_id!(
    AccountNumber,
    "Account number. Chosen by the caller, immutable, and the account's primary key."
);
typed_id!(
    TransactionId,
    "Identifier of a persisted transaction record, assigned by the store."
);

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
