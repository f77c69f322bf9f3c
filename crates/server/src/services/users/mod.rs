//! User service.
//!
//! Thin orchestration over the user repository: existence checks before
//! create, not-found checks before update, and translation of repository
//! error kinds into service-level variants. All persistence happens in
//! the repository.

mod error;

pub use error::UserServiceError;

use sqlx::PgPool;

use roster_core::{
    Email, NewUser, NewUserInput, User, UserId, UserPatch, UserPatchInput, UserStatus,
    ValidationError,
};

use crate::db::{ErrorKind, UserRepository};

/// User management service.
pub struct UserService<'a> {
    users: UserRepository<'a>,
}

impl<'a> UserService<'a> {
    /// Create a new user service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user.
    ///
    /// The `find_by_email` pre-check is a latency optimization only: two
    /// concurrent creates for the same email are serialized by the unique
    /// index, and a `DuplicateKey` from the insert maps to the same
    /// `AlreadyExists` as the pre-check, so behavior is observably
    /// consistent either way.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::InvalidInput` if validation fails.
    /// Returns `UserServiceError::AlreadyExists` if the email is taken.
    pub async fn create_user(&self, input: NewUserInput) -> Result<User, UserServiceError> {
        let new_user = NewUser::parse(input)?;

        if self.users.find_by_email(&new_user.email).await?.is_some() {
            return Err(UserServiceError::AlreadyExists);
        }

        self.users
            .create(&new_user)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::DuplicateKey => UserServiceError::AlreadyExists,
                _ => UserServiceError::Repository(e),
            })
    }

    /// Register a batch of users, all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::InvalidBatch` citing the first failing
    /// record; returns `UserServiceError::AlreadyExists` if any email in
    /// the batch collides (nothing is inserted).
    pub async fn create_users(
        &self,
        inputs: Vec<NewUserInput>,
    ) -> Result<Vec<User>, UserServiceError> {
        let new_users = NewUser::parse_many(inputs)?;

        self.users
            .create_many(&new_users)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::DuplicateKey => UserServiceError::AlreadyExists,
                _ => UserServiceError::Repository(e),
            })
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::NotFound` if the id is absent.
    pub async fn get_user(&self, id: UserId) -> Result<User, UserServiceError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(UserServiceError::NotFound)
    }

    /// Get a user by email; the input is normalized before lookup.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::InvalidInput` for malformed addresses
    /// and `UserServiceError::NotFound` if no user matches.
    pub async fn get_user_by_email(&self, email: &str) -> Result<User, UserServiceError> {
        let email = Email::parse(email).map_err(ValidationError::Email)?;

        self.users
            .find_by_email(&email)
            .await?
            .ok_or(UserServiceError::NotFound)
    }

    /// List users; active only unless `include_inactive` is set.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Repository` if the query fails.
    pub async fn list_users(&self, include_inactive: bool) -> Result<Vec<User>, UserServiceError> {
        let users = if include_inactive {
            self.users.find_all().await?
        } else {
            self.users.find_active().await?
        };
        Ok(users)
    }

    /// Apply a partial update to a user.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::InvalidInput` if validation fails,
    /// `UserServiceError::NotFound` if the id is absent, and
    /// `UserServiceError::AlreadyExists` when changing to a taken email.
    pub async fn update_user(
        &self,
        id: UserId,
        input: UserPatchInput,
    ) -> Result<User, UserServiceError> {
        let patch = UserPatch::parse(input)?;

        self.users
            .update(id, &patch)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => UserServiceError::NotFound,
                ErrorKind::DuplicateKey => UserServiceError::AlreadyExists,
                _ => UserServiceError::Repository(e),
            })
    }

    /// Deactivate a user (soft delete).
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::OperationFailed` when the soft delete
    /// reports no row affected.
    pub async fn deactivate_user(&self, id: UserId) -> Result<(), UserServiceError> {
        let deactivated = self.users.soft_delete(id).await?;
        if deactivated {
            Ok(())
        } else {
            Err(UserServiceError::OperationFailed("deactivate_user"))
        }
    }

    /// Count users, optionally scoped to one status.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Repository` if the query fails.
    pub async fn count_users(&self, status: Option<UserStatus>) -> Result<i64, UserServiceError> {
        Ok(self.users.count(status).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    /// A pool that never connects; validation failures must surface
    /// before any storage access is attempted.
    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/unreachable")
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_user_rejects_invalid_email_before_storage() {
        let pool = lazy_pool();
        let service = UserService::new(&pool);

        let err = service
            .create_user(NewUserInput {
                name: "ok".to_owned(),
                email: "bad".to_owned(),
                status: None,
            })
            .await
            .unwrap_err();

        match err {
            UserServiceError::InvalidInput(validation) => {
                assert_eq!(validation.field(), "email");
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_users_rejects_bad_batch_before_storage() {
        let pool = lazy_pool();
        let service = UserService::new(&pool);

        let err = service
            .create_users(vec![
                NewUserInput {
                    name: "A".to_owned(),
                    email: "a@x.com".to_owned(),
                    status: None,
                },
                NewUserInput {
                    name: "".to_owned(),
                    email: "b@x.com".to_owned(),
                    status: None,
                },
            ])
            .await
            .unwrap_err();

        match err {
            UserServiceError::InvalidBatch(batch) => {
                assert_eq!(batch.index, 1);
                assert_eq!(batch.source.field(), "name");
            }
            other => panic!("expected InvalidBatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_user_by_email_rejects_malformed_address() {
        let pool = lazy_pool();
        let service = UserService::new(&pool);

        let err = service.get_user_by_email("not-an-email").await.unwrap_err();
        assert!(matches!(err, UserServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_update_user_rejects_invalid_patch_before_storage() {
        let pool = lazy_pool();
        let service = UserService::new(&pool);

        let err = service
            .update_user(
                UserId::new(1),
                UserPatchInput {
                    email: Some("broken".to_owned()),
                    ..UserPatchInput::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, UserServiceError::InvalidInput(_)));
    }
}
