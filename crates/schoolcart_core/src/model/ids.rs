//! Numeric storage keys with a string boundary representation.
//!
//! # Responsibility
//! - Give every entity key its own type so SQL binds cannot mix them up.
//! - Convert between external string ids and numeric storage keys.
//!
//! # Invariants
//! - External form is the decimal rendering of the key, nothing else.
//! - A string that is not a plain `i64` never produces an id.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Error returned when an external id string is not a numeric key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParseError {
    kind: &'static str,
    value: String,
}

impl IdParseError {
    /// Entity kind the value was parsed for (`school`, `grade`, ...).
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl Display for IdParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} id `{}`", self.kind, self.value)
    }
}

impl Error for IdParseError {}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Raw storage key.
            pub const fn get(self) -> i64 {
                self.0
            }

            /// Parses an external id, mapping malformed input to `None`.
            pub fn parse_external(value: &str) -> Option<Self> {
                value.parse().ok()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                value.parse::<i64>().map(Self).map_err(|_| IdParseError {
                    kind: $kind,
                    value: value.to_string(),
                })
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdParseError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0.to_string()
            }
        }
    };
}

numeric_id!(
    /// Key of a `school` row.
    SchoolId,
    "school"
);
numeric_id!(
    /// Key of a `grade` row.
    GradeId,
    "grade"
);
numeric_id!(
    /// Key of an `equipment` row.
    EquipmentId,
    "equipment"
);
numeric_id!(
    /// Key of a `users` row.
    UserId,
    "user"
);
numeric_id!(
    /// Key of a `cart_entry` row. Reassigned on every save.
    CartEntryId,
    "cart entry"
);
