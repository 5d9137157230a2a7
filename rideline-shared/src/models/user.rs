/// User model and database operations
///
/// Users are riders or passengers, identified by a unique phone number and an
/// id handed out by the sequence allocator.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGINT PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     phone VARCHAR(32) NOT NULL,
///     picture VARCHAR(512),
///     role SMALLINT NOT NULL DEFAULT 0 CHECK (role IN (0, 1)),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE UNIQUE INDEX users_phone_key ON users (phone);
/// ```
///
/// # Example
///
/// ```no_run
/// use rideline_shared::models::user::{CreateUser, User, UserRole};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::insert(&pool, CreateUser {
///     id: 1,
///     name: "Ana".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     phone: "0800000001".to_string(),
///     picture: None,
///     role: UserRole::Passenger.code(),
/// }).await?;
///
/// assert_eq!(user.role, 0);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

/// Account role, stored as a SMALLINT code
///
/// The wire format is the numeric code (0 or 1), matching what clients send
/// in registration requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    /// Requests rides (code 0, the default)
    Passenger,

    /// Provides rides and owns a vehicle record (code 1)
    Rider,
}

impl UserRole {
    /// Parses a role code; anything outside {0, 1} is rejected
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(UserRole::Passenger),
            1 => Some(UserRole::Rider),
            _ => None,
        }
    }

    /// The SMALLINT code stored in the database
    pub fn code(&self) -> i16 {
        match self {
            UserRole::Passenger => 0,
            UserRole::Rider => 1,
        }
    }

    /// Human-readable name for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Passenger => "passenger",
            UserRole::Rider => "rider",
        }
    }
}

/// User account row
///
/// `password_hash` is an Argon2id hash and never serializes outward.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Sequence-allocated id
    pub id: i64,

    /// Display name
    pub name: String,

    /// Argon2id password hash, never plaintext
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Phone number, unique across all users
    pub phone: String,

    /// Optional profile picture URL
    pub picture: Option<String>,

    /// Role code: 0 = passenger, 1 = rider
    pub role: i16,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a user row
///
/// The id must already have been allocated from `user_seq` and the password
/// already hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: i64,
    pub name: String,
    pub password_hash: String,
    pub phone: String,
    pub picture: Option<String>,
    pub role: i16,
}

/// Input for partially updating a user
///
/// Only non-None fields are written. `picture` uses the double-Option so
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub phone: Option<String>,
    pub picture: Option<Option<String>>,
    pub role: Option<i16>,
}

impl User {
    /// Inserts a new user row
    ///
    /// Takes any Postgres executor so the registrar can insert inside an open
    /// transaction (rider registration writes the user and the vehicle
    /// atomically).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The phone number already exists (unique index violation)
    /// - Database connection fails
    pub async fn insert<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, password_hash, phone, picture, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, password_hash, phone, picture, role, created_at, updated_at
            "#,
        )
        .bind(data.id)
        .bind(data.name)
        .bind(data.password_hash)
        .bind(data.phone)
        .bind(data.picture)
        .bind(data.role)
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    /// Finds a user by id
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, password_hash, phone, picture, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by phone number
    ///
    /// # Errors
    ///
    /// Returns an error if database connection fails
    pub async fn find_by_phone(pool: &PgPool, phone: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, password_hash, phone, picture, role, created_at, updated_at
            FROM users
            WHERE phone = $1
            "#,
        )
        .bind(phone)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Lists users with keyset pagination
    ///
    /// Results are ordered by id. `start_after` is the id cursor from the
    /// previous page; None starts from the beginning.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use rideline_shared::models::user::User;
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// let page1 = User::list(&pool, 10, None).await?;
    /// let cursor = page1.last().map(|u| u.id);
    /// let page2 = User::list(&pool, 10, cursor).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list(
        pool: &PgPool,
        limit: i64,
        start_after: Option<i64>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, password_hash, phone, picture, role, created_at, updated_at
            FROM users
            WHERE ($2::bigint IS NULL OR id > $2)
            ORDER BY id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .bind(start_after)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Updates an existing user
    ///
    /// Only the fields present in `data` are written; `updated_at` is always
    /// refreshed. Returns None if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The new phone number belongs to another user (unique index violation)
    /// - Database connection fails
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build the UPDATE dynamically from the fields that are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }
        if data.phone.is_some() {
            bind_count += 1;
            query.push_str(&format!(", phone = ${}", bind_count));
        }
        if data.picture.is_some() {
            bind_count += 1;
            query.push_str(&format!(", picture = ${}", bind_count));
        }
        if data.role.is_some() {
            bind_count += 1;
            query.push_str(&format!(", role = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, name, password_hash, phone, picture, role, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(phone) = data.phone {
            q = q.bind(phone);
        }
        if let Some(picture_opt) = data.picture {
            q = q.bind(picture_opt);
        }
        if let Some(role) = data.role {
            q = q.bind(role);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }

    /// Deletes a user by id
    ///
    /// Addresses and vehicle records owned by the user are removed by the
    /// store's ON DELETE CASCADE.
    ///
    /// # Returns
    ///
    /// True if a row was deleted, false if the user didn't exist
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_code() {
        assert_eq!(UserRole::from_code(0), Some(UserRole::Passenger));
        assert_eq!(UserRole::from_code(1), Some(UserRole::Rider));
        assert_eq!(UserRole::from_code(2), None);
        assert_eq!(UserRole::from_code(-1), None);
    }

    #[test]
    fn test_role_roundtrip() {
        for role in [UserRole::Passenger, UserRole::Rider] {
            assert_eq!(UserRole::from_code(role.code()), Some(role));
        }
    }

    #[test]
    fn test_role_names() {
        assert_eq!(UserRole::Passenger.as_str(), "passenger");
        assert_eq!(UserRole::Rider.as_str(), "rider");
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: 7,
            name: "Ana".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            phone: "0800000001".to_string(),
            picture: None,
            role: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["phone"], "0800000001");
    }
}
