//! The User entity and validated input shapes.
//!
//! Untrusted input enters through [`NewUserInput`] / [`UserPatchInput`]
//! (plain serde structs) and is parsed into [`NewUser`] / [`UserPatch`]
//! before it can reach the persistence layer. Parsing is pure and
//! deterministic: the same input always yields the same value or the same
//! error.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::types::{
    Email, EmailError, UserId, UserName, UserNameError, UserStatus, UserStatusError,
};

/// A user (domain type).
///
/// Only the repository constructs these, from database rows; `id` and the
/// timestamps are server-assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: UserName,
    /// Normalized, globally unique email address.
    pub email: Email,
    /// Lifecycle status.
    pub status: UserStatus,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the user is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// A field-level validation failure.
///
/// Wraps the per-type parse errors and reports which field was at fault;
/// the first violated constraint wins.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The `name` field failed validation.
    #[error("invalid name: {0}")]
    Name(#[from] UserNameError),

    /// The `email` field failed validation.
    #[error("invalid email: {0}")]
    Email(#[from] EmailError),

    /// The `status` field failed validation.
    #[error("invalid status: {0}")]
    Status(#[from] UserStatusError),
}

impl ValidationError {
    /// The name of the offending field.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::Email(_) => "email",
            Self::Status(_) => "status",
        }
    }
}

/// A validation failure inside a batch; reports the failing index.
///
/// Batch validation has no partial-batch semantics: the first failing
/// record aborts the whole batch.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("record {index}: {source}")]
pub struct BatchValidationError {
    /// Zero-based index of the failing record.
    pub index: usize,
    /// The underlying field failure.
    #[source]
    pub source: ValidationError,
}

// =============================================================================
// New User
// =============================================================================

/// Untrusted input for creating a user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUserInput {
    /// Display name (required).
    pub name: String,
    /// Email address (required).
    pub email: String,
    /// Lifecycle status; defaults to `active` when absent.
    #[serde(default)]
    pub status: Option<String>,
}

/// A fully validated, normalized record ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Normalized display name.
    pub name: UserName,
    /// Normalized email address.
    pub email: Email,
    /// Lifecycle status.
    pub status: UserStatus,
}

impl NewUser {
    /// Validate and normalize untrusted input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] citing the first violated constraint.
    pub fn parse(input: NewUserInput) -> Result<Self, ValidationError> {
        let name = UserName::parse(&input.name)?;
        let email = Email::parse(&input.email)?;
        let status = match input.status.as_deref() {
            Some(raw) => raw.parse::<UserStatus>()?,
            None => UserStatus::default(),
        };

        Ok(Self {
            name,
            email,
            status,
        })
    }

    /// Validate a batch of inputs elementwise.
    ///
    /// # Errors
    ///
    /// Returns [`BatchValidationError`] for the first failing record; the
    /// whole batch is rejected.
    pub fn parse_many(
        inputs: impl IntoIterator<Item = NewUserInput>,
    ) -> Result<Vec<Self>, BatchValidationError> {
        inputs
            .into_iter()
            .enumerate()
            .map(|(index, input)| {
                Self::parse(input).map_err(|source| BatchValidationError { index, source })
            })
            .collect()
    }
}

// =============================================================================
// User Patch
// =============================================================================

/// Untrusted input for a partial update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatchInput {
    /// New display name, if changing.
    pub name: Option<String>,
    /// New email address, if changing.
    pub email: Option<String>,
    /// New lifecycle status, if changing.
    pub status: Option<String>,
}

/// A validated partial update: only supplied fields change.
///
/// The empty patch is valid and denotes a no-op update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    /// New display name, if changing.
    pub name: Option<UserName>,
    /// New email address, if changing (re-normalized at parse time).
    pub email: Option<Email>,
    /// New lifecycle status, if changing.
    pub status: Option<UserStatus>,
}

impl UserPatch {
    /// Validate and normalize untrusted input; absent fields stay absent.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] citing the first violated constraint.
    pub fn parse(input: UserPatchInput) -> Result<Self, ValidationError> {
        let name = input.name.as_deref().map(UserName::parse).transpose()?;
        let email = input.email.as_deref().map(Email::parse).transpose()?;
        let status = input
            .status
            .as_deref()
            .map(str::parse::<UserStatus>)
            .transpose()?;

        Ok(Self {
            name,
            email,
            status,
        })
    }

    /// Whether this patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.status.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(name: &str, email: &str) -> NewUserInput {
        NewUserInput {
            name: name.to_owned(),
            email: email.to_owned(),
            status: None,
        }
    }

    #[test]
    fn test_parse_new_user_defaults_to_active() {
        let user = NewUser::parse(input("Ada", "ada@example.com")).unwrap();
        assert_eq!(user.name.as_str(), "Ada");
        assert_eq!(user.email.as_str(), "ada@example.com");
        assert_eq!(user.status, UserStatus::Active);
    }

    #[test]
    fn test_parse_new_user_explicit_status() {
        let user = NewUser::parse(NewUserInput {
            status: Some("inactive".to_owned()),
            ..input("Ada", "ada@example.com")
        })
        .unwrap();
        assert_eq!(user.status, UserStatus::Inactive);
    }

    #[test]
    fn test_parse_new_user_normalizes() {
        let user = NewUser::parse(input("  Ada   Lovelace ", " ADA@Example.COM ")).unwrap();
        assert_eq!(user.name.as_str(), "Ada Lovelace");
        assert_eq!(user.email.as_str(), "ada@example.com");
    }

    #[test]
    fn test_parse_new_user_bad_email_cites_field() {
        let err = NewUser::parse(input("ok", "bad")).unwrap_err();
        assert_eq!(err.field(), "email");
        assert!(matches!(err, ValidationError::Email(_)));
    }

    #[test]
    fn test_parse_new_user_bad_name_cites_field() {
        let err = NewUser::parse(input("   ", "a@b.c")).unwrap_err();
        assert_eq!(err.field(), "name");
    }

    #[test]
    fn test_parse_new_user_bad_status() {
        let err = NewUser::parse(NewUserInput {
            status: Some("archived".to_owned()),
            ..input("Ada", "ada@example.com")
        })
        .unwrap_err();
        assert_eq!(err.field(), "status");
    }

    #[test]
    fn test_parse_many_empty() {
        let users = NewUser::parse_many(Vec::new()).unwrap();
        assert!(users.is_empty());
    }

    #[test]
    fn test_parse_many_all_valid() {
        let users = NewUser::parse_many(vec![
            input("A", "a@x.com"),
            input("B", "b@x.com"),
        ])
        .unwrap();
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn test_parse_many_reports_failing_index() {
        let err = NewUser::parse_many(vec![
            input("A", "a@x.com"),
            input("B", "not-an-email"),
            input("C", "c@x.com"),
        ])
        .unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.source.field(), "email");
    }

    #[test]
    fn test_parse_patch_empty_is_valid() {
        let patch = UserPatch::parse(UserPatchInput::default()).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_parse_patch_partial() {
        let patch = UserPatch::parse(UserPatchInput {
            name: Some("New Name".to_owned()),
            ..UserPatchInput::default()
        })
        .unwrap();
        assert_eq!(patch.name.unwrap().as_str(), "New Name");
        assert!(patch.email.is_none());
        assert!(patch.status.is_none());
    }

    #[test]
    fn test_parse_patch_renormalizes_email() {
        let patch = UserPatch::parse(UserPatchInput {
            email: Some(" Ada@EXAMPLE.com ".to_owned()),
            ..UserPatchInput::default()
        })
        .unwrap();
        assert_eq!(patch.email.unwrap().as_str(), "ada@example.com");
    }

    #[test]
    fn test_parse_patch_rejects_bad_field() {
        let err = UserPatch::parse(UserPatchInput {
            email: Some("nope".to_owned()),
            ..UserPatchInput::default()
        })
        .unwrap_err();
        assert_eq!(err.field(), "email");
    }

    #[test]
    fn test_deserialize_new_user_input() {
        let parsed: NewUserInput =
            serde_json::from_str(r#"{"name":"Ada","email":"ada@example.com"}"#).unwrap();
        assert!(parsed.status.is_none());
        assert!(NewUser::parse(parsed).is_ok());
    }
}
