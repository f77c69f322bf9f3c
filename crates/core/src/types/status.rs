//! Status enum for users.

use serde::{Deserialize, Serialize};

/// Error returned when parsing a [`UserStatus`] from a string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid user status: {value} (expected 'active' or 'inactive')")]
pub struct UserStatusError {
    /// The rejected input.
    pub value: String,
}

/// Lifecycle status of a user.
///
/// Users are never physically deleted; deactivation transitions
/// `Active -> Inactive` and the row stays in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

impl UserStatus {
    /// Returns the canonical string form stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserStatus {
    type Err = UserStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(UserStatusError {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_active() {
        assert_eq!(UserStatus::default(), UserStatus::Active);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("active".parse::<UserStatus>().unwrap(), UserStatus::Active);
        assert_eq!(
            "inactive".parse::<UserStatus>().unwrap(),
            UserStatus::Inactive
        );
        assert!("deleted".parse::<UserStatus>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for status in [UserStatus::Active, UserStatus::Inactive] {
            let parsed: UserStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&UserStatus::Inactive).unwrap();
        assert_eq!(json, "\"inactive\"");

        let parsed: UserStatus = serde_json::from_str("\"active\"").unwrap();
        assert_eq!(parsed, UserStatus::Active);
    }
}
