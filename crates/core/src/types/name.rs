//! Display name type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`UserName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UserNameError {
    /// The input is empty after trimming.
    #[error("name cannot be empty")]
    Empty,
    /// The input is too long after normalization.
    #[error("name must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A user's display name.
///
/// Parsing normalizes the input: surrounding whitespace is trimmed and runs
/// of interior whitespace collapse to a single space.
///
/// ## Constraints
///
/// - Length: 1-100 characters after normalization
///
/// ## Examples
///
/// ```
/// use roster_core::UserName;
///
/// let name = UserName::parse("  Ada   Lovelace ").unwrap();
/// assert_eq!(name.as_str(), "Ada Lovelace");
///
/// assert!(UserName::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserName(String);

impl UserName {
    /// Maximum length of a display name.
    pub const MAX_LENGTH: usize = 100;

    /// Parse a `UserName` from a string, normalizing whitespace first.
    ///
    /// # Errors
    ///
    /// Returns an error if the normalized input is empty or longer than
    /// 100 characters.
    pub fn parse(s: &str) -> Result<Self, UserNameError> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");

        if normalized.is_empty() {
            return Err(UserNameError::Empty);
        }

        if normalized.chars().count() > Self::MAX_LENGTH {
            return Err(UserNameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(normalized))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `UserName` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserName {
    type Err = UserNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for UserName {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for UserName {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed normalized
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for UserName {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let name = UserName::parse("Ada").unwrap();
        assert_eq!(name.as_str(), "Ada");
    }

    #[test]
    fn test_parse_collapses_whitespace() {
        let name = UserName::parse("  Ada \t  Lovelace  ").unwrap();
        assert_eq!(name.as_str(), "Ada Lovelace");
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(UserName::parse(""), Err(UserNameError::Empty)));
        assert!(matches!(UserName::parse("   "), Err(UserNameError::Empty)));
    }

    #[test]
    fn test_parse_max_length() {
        let at_limit = "a".repeat(100);
        assert!(UserName::parse(&at_limit).is_ok());

        let over_limit = "a".repeat(101);
        assert!(matches!(
            UserName::parse(&over_limit),
            Err(UserNameError::TooLong { .. })
        ));
    }

    #[test]
    fn test_length_counted_after_collapse() {
        // 100 chars of content padded with collapsible whitespace is fine
        let padded = format!("  {}  ", "a".repeat(100));
        assert!(UserName::parse(&padded).is_ok());
    }

    #[test]
    fn test_display() {
        let name = UserName::parse("Grace Hopper").unwrap();
        assert_eq!(format!("{name}"), "Grace Hopper");
    }

    #[test]
    fn test_serde_roundtrip() {
        let name = UserName::parse("Ada").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"Ada\"");

        let parsed: UserName = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, name);
    }
}
