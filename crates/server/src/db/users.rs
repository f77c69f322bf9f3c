//! User repository for database operations.
//!
//! This module owns SQL construction and all translation between raw rows
//! and the [`User`] domain type; no other component touches rows. Queries
//! use the runtime sqlx API with [`sqlx::FromRow`] row structs so the
//! workspace builds without a live database.
//!
//! Every single-entity operation has a `*_in` variant taking
//! `&mut PgConnection`, which callers use to scope the statement to their
//! own open transaction; the executor type distinguishes a pooled
//! connection from a transaction, so there is no runtime shape-sniffing.

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use sqlx::{PgConnection, PgExecutor, PgPool};

use roster_core::{Email, NewUser, User, UserId, UserName, UserPatch, UserStatus};

use super::RepositoryError;

/// Entity tag attached to every error this repository produces.
const ENTITY: &str = "user";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    status: UserStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let name = UserName::parse(&row.name).map_err(|e| {
            RepositoryError::operation_failed(format!("invalid name in database: {e}"))
                .with_entity(ENTITY)
        })?;
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::operation_failed(format!("invalid email in database: {e}"))
                .with_entity(ENTITY)
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            name,
            email,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Column list shared by every query returning full rows.
const USER_COLUMNS: &str = "id, name, email, status, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Get a user by their ID; `Ok(None)` when the id is absent.
    ///
    /// # Errors
    ///
    /// Returns the classified [`RepositoryError`] if the query fails or the
    /// stored data is invalid.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Self::find_by_id_on(self.pool, id).await
    }

    /// Transaction-scoped variant of [`Self::find_by_id`].
    ///
    /// # Errors
    ///
    /// See [`Self::find_by_id`].
    pub async fn find_by_id_in(
        conn: &mut PgConnection,
        id: UserId,
    ) -> Result<Option<User>, RepositoryError> {
        Self::find_by_id_on(&mut *conn, id).await
    }

    async fn find_by_id_on<'e, E>(executor: E, id: UserId) -> Result<Option<User>, RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(executor)
        .await
        .map_err(|e| RepositoryError::from_sqlx("find_by_id", e).with_entity(ENTITY))?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by email; the [`Email`] type guarantees the lookup value
    /// is already in canonical form.
    ///
    /// # Errors
    ///
    /// Returns the classified [`RepositoryError`] if the query fails or the
    /// stored data is invalid.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Self::find_by_email_on(self.pool, email).await
    }

    /// Transaction-scoped variant of [`Self::find_by_email`].
    ///
    /// # Errors
    ///
    /// See [`Self::find_by_email`].
    pub async fn find_by_email_in(
        conn: &mut PgConnection,
        email: &Email,
    ) -> Result<Option<User>, RepositoryError> {
        Self::find_by_email_on(&mut *conn, email).await
    }

    async fn find_by_email_on<'e, E>(
        executor: E,
        email: &Email,
    ) -> Result<Option<User>, RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(executor)
        .await
        .map_err(|e| RepositoryError::from_sqlx("find_by_email", e).with_entity(ENTITY))?;

        row.map(TryInto::try_into).transpose()
    }

    /// List every user, active or not.
    ///
    /// Unbounded; ordered by id for stable output.
    ///
    /// # Errors
    ///
    /// Returns the classified [`RepositoryError`] if the query fails or any
    /// stored data is invalid.
    pub async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx("find_all", e).with_entity(ENTITY))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List active users only.
    ///
    /// # Errors
    ///
    /// Returns the classified [`RepositoryError`] if the query fails or any
    /// stored data is invalid.
    pub async fn find_active(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE status = 'active' ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx("find_active", e).with_entity(ENTITY))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Count users, optionally scoped to one status.
    ///
    /// # Errors
    ///
    /// Returns the classified [`RepositoryError`] if the query fails.
    pub async fn count(&self, status: Option<UserStatus>) -> Result<i64, RepositoryError> {
        Self::count_on(self.pool, status).await
    }

    /// Transaction-scoped variant of [`Self::count`].
    ///
    /// # Errors
    ///
    /// See [`Self::count`].
    pub async fn count_in(
        conn: &mut PgConnection,
        status: Option<UserStatus>,
    ) -> Result<i64, RepositoryError> {
        Self::count_on(&mut *conn, status).await
    }

    async fn count_on<'e, E>(
        executor: E,
        status: Option<UserStatus>,
    ) -> Result<i64, RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE ($1::user_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(executor)
        .await
        .map_err(|e| RepositoryError::from_sqlx("count", e).with_entity(ENTITY))?;

        Ok(count)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Insert a validated user; the server assigns id and timestamps.
    ///
    /// # Errors
    ///
    /// Returns a `DuplicateKey`-kind error on email collision and the
    /// classified [`RepositoryError`] for other failures.
    pub async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        Self::create_on(self.pool, user).await
    }

    /// Transaction-scoped variant of [`Self::create`].
    ///
    /// # Errors
    ///
    /// See [`Self::create`].
    pub async fn create_in(
        conn: &mut PgConnection,
        user: &NewUser,
    ) -> Result<User, RepositoryError> {
        Self::create_on(&mut *conn, user).await
    }

    async fn create_on<'e, E>(executor: E, user: &NewUser) -> Result<User, RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (name, email, status) \
             VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(user.status)
        .fetch_one(executor)
        .await
        .map_err(|e| RepositoryError::from_sqlx("create", e).with_entity(ENTITY))?;

        row.try_into()
    }

    /// Insert a batch of validated users in one statement, all-or-nothing.
    ///
    /// Empty input short-circuits to an empty result without touching the
    /// database. Any failure (including one duplicate email) aborts the
    /// entire batch; there is no partial insert.
    ///
    /// # Errors
    ///
    /// Returns a `DuplicateKey`-kind error on email collision and the
    /// classified [`RepositoryError`] for other failures.
    pub async fn create_many(&self, users: &[NewUser]) -> Result<Vec<User>, RepositoryError> {
        Self::create_many_on(self.pool, users).await
    }

    /// Transaction-scoped variant of [`Self::create_many`].
    ///
    /// # Errors
    ///
    /// See [`Self::create_many`].
    pub async fn create_many_in(
        conn: &mut PgConnection,
        users: &[NewUser],
    ) -> Result<Vec<User>, RepositoryError> {
        Self::create_many_on(&mut *conn, users).await
    }

    async fn create_many_on<'e, E>(
        executor: E,
        users: &[NewUser],
    ) -> Result<Vec<User>, RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        if users.is_empty() {
            return Ok(Vec::new());
        }

        let names: Vec<String> = users.iter().map(|u| u.name.as_str().to_owned()).collect();
        let emails: Vec<String> = users.iter().map(|u| u.email.as_str().to_owned()).collect();
        let statuses: Vec<UserStatus> = users.iter().map(|u| u.status).collect();

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (name, email, status) \
             SELECT * FROM UNNEST($1::text[], $2::text[], $3::user_status[]) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(names)
        .bind(emails)
        .bind(statuses)
        .fetch_all(executor)
        .await
        .map_err(|e| RepositoryError::from_sqlx("create_many", e).with_entity(ENTITY))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Merge the supplied fields into a user; `updated_at` always refreshes.
    ///
    /// The empty patch is a valid no-op update and still advances
    /// `updated_at` (a mutation per the monotonic-timestamp invariant).
    ///
    /// # Errors
    ///
    /// Returns a `NotFound`-kind error if the id is absent, a
    /// `DuplicateKey`-kind error when changing to a taken email, and the
    /// classified [`RepositoryError`] for other failures.
    pub async fn update(&self, id: UserId, patch: &UserPatch) -> Result<User, RepositoryError> {
        Self::update_on(self.pool, id, patch).await
    }

    /// Transaction-scoped variant of [`Self::update`].
    ///
    /// # Errors
    ///
    /// See [`Self::update`].
    pub async fn update_in(
        conn: &mut PgConnection,
        id: UserId,
        patch: &UserPatch,
    ) -> Result<User, RepositoryError> {
        Self::update_on(&mut *conn, id, patch).await
    }

    async fn update_on<'e, E>(
        executor: E,
        id: UserId,
        patch: &UserPatch,
    ) -> Result<User, RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users \
             SET name = COALESCE($2, name), \
                 email = COALESCE($3, email), \
                 status = COALESCE($4, status), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(patch.name.as_ref().map(UserName::as_str))
        .bind(patch.email.as_ref().map(Email::as_str))
        .bind(patch.status)
        .fetch_optional(executor)
        .await
        .map_err(|e| RepositoryError::from_sqlx("update", e).with_entity(ENTITY))?
        .ok_or_else(|| {
            RepositoryError::not_found(format!("user {id} does not exist"))
                .with_operation("update")
                .with_entity(ENTITY)
        })?;

        row.try_into()
    }

    /// Bulk field update scoped by an optional status filter.
    ///
    /// Returns the affected row count; zero matches is not an error.
    ///
    /// # Errors
    ///
    /// Returns the classified [`RepositoryError`] if the statement fails.
    pub async fn update_many(
        &self,
        filter: Option<UserStatus>,
        patch: &UserPatch,
    ) -> Result<u64, RepositoryError> {
        Self::update_many_on(self.pool, filter, patch).await
    }

    /// Transaction-scoped variant of [`Self::update_many`].
    ///
    /// # Errors
    ///
    /// See [`Self::update_many`].
    pub async fn update_many_in(
        conn: &mut PgConnection,
        filter: Option<UserStatus>,
        patch: &UserPatch,
    ) -> Result<u64, RepositoryError> {
        Self::update_many_on(&mut *conn, filter, patch).await
    }

    async fn update_many_on<'e, E>(
        executor: E,
        filter: Option<UserStatus>,
        patch: &UserPatch,
    ) -> Result<u64, RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE users \
             SET name = COALESCE($2, name), \
                 email = COALESCE($3, email), \
                 status = COALESCE($4, status), \
                 updated_at = now() \
             WHERE ($1::user_status IS NULL OR status = $1)",
        )
        .bind(filter)
        .bind(patch.name.as_ref().map(UserName::as_str))
        .bind(patch.email.as_ref().map(Email::as_str))
        .bind(patch.status)
        .execute(executor)
        .await
        .map_err(|e| RepositoryError::from_sqlx("update_many", e).with_entity(ENTITY))?;

        Ok(result.rows_affected())
    }

    /// Mark a user inactive.
    ///
    /// Returns `true` when a row was matched, `false` when the id is
    /// absent; a missing id is not an error here (unlike [`Self::update`]).
    /// Deactivating an already-inactive user succeeds and leaves the row
    /// inactive, so the call is idempotent.
    ///
    /// # Errors
    ///
    /// Returns the classified [`RepositoryError`] if the statement fails.
    pub async fn soft_delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        Self::soft_delete_on(self.pool, id).await
    }

    /// Transaction-scoped variant of [`Self::soft_delete`].
    ///
    /// # Errors
    ///
    /// See [`Self::soft_delete`].
    pub async fn soft_delete_in(
        conn: &mut PgConnection,
        id: UserId,
    ) -> Result<bool, RepositoryError> {
        Self::soft_delete_on(&mut *conn, id).await
    }

    async fn soft_delete_on<'e, E>(executor: E, id: UserId) -> Result<bool, RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE users SET status = 'inactive', updated_at = now() WHERE id = $1",
        )
        .bind(id.as_i32())
        .execute(executor)
        .await
        .map_err(|e| RepositoryError::from_sqlx("soft_delete", e).with_entity(ENTITY))?;

        Ok(result.rows_affected() > 0)
    }

    /// Bulk status transition to inactive, scoped by an optional filter.
    ///
    /// Returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns the classified [`RepositoryError`] if the statement fails.
    pub async fn soft_delete_many(
        &self,
        filter: Option<UserStatus>,
    ) -> Result<u64, RepositoryError> {
        Self::soft_delete_many_on(self.pool, filter).await
    }

    /// Transaction-scoped variant of [`Self::soft_delete_many`].
    ///
    /// # Errors
    ///
    /// See [`Self::soft_delete_many`].
    pub async fn soft_delete_many_in(
        conn: &mut PgConnection,
        filter: Option<UserStatus>,
    ) -> Result<u64, RepositoryError> {
        Self::soft_delete_many_on(&mut *conn, filter).await
    }

    async fn soft_delete_many_on<'e, E>(
        executor: E,
        filter: Option<UserStatus>,
    ) -> Result<u64, RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE users SET status = 'inactive', updated_at = now() \
             WHERE ($1::user_status IS NULL OR status = $1)",
        )
        .bind(filter)
        .execute(executor)
        .await
        .map_err(|e| RepositoryError::from_sqlx("soft_delete_many", e).with_entity(ENTITY))?;

        Ok(result.rows_affected())
    }

    /// Physically remove a user row.
    ///
    /// Test cleanup only; nothing in the service layer calls this. Returns
    /// `true` if a row was removed.
    ///
    /// # Errors
    ///
    /// Returns the classified [`RepositoryError`] if the statement fails.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_sqlx("delete", e).with_entity(ENTITY))?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Run `op` inside a transaction: commit on `Ok`, roll back on `Err`.
    ///
    /// The closure receives a `&mut PgConnection` scoped to the
    /// transaction; pass it to the `*_in` repository variants.
    ///
    /// # Errors
    ///
    /// Returns the closure's error after rolling back, or the classified
    /// [`RepositoryError`] if beginning or committing fails.
    pub async fn with_transaction<T, F>(&self, op: F) -> Result<T, RepositoryError>
    where
        F: for<'t> FnOnce(&'t mut PgConnection) -> BoxFuture<'t, Result<T, RepositoryError>>,
    {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::from_sqlx("begin", e).with_entity(ENTITY))?;

        match op(&mut *tx).await {
            Ok(value) => {
                tx.commit()
                    .await
                    .map_err(|e| RepositoryError::from_sqlx("commit", e).with_entity(ENTITY))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "transaction rollback failed");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::ErrorKind;

    fn row(name: &str, email: &str) -> UserRow {
        UserRow {
            id: 1,
            name: name.to_owned(),
            email: email.to_owned(),
            status: UserStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_converts_to_domain_user() {
        let user = User::try_from(row("Ada", "ada@example.com")).unwrap();
        assert_eq!(user.id, UserId::new(1));
        assert_eq!(user.name.as_str(), "Ada");
        assert_eq!(user.email.as_str(), "ada@example.com");
        assert!(user.is_active());
    }

    #[test]
    fn test_corrupt_email_maps_to_operation_error() {
        let err = User::try_from(row("Ada", "not-an-email")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operation);
        assert_eq!(err.entity(), Some("user"));
    }

    #[test]
    fn test_corrupt_name_maps_to_operation_error() {
        let err = User::try_from(row("   ", "ada@example.com")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operation);
    }
}
