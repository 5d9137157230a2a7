/// Address model and database operations
///
/// Addresses belong to a user; a user can have any number of them. Rows are
/// removed with their owner via ON DELETE CASCADE.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE addresses (
///     id BIGINT PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     address TEXT NOT NULL,
///     lat DOUBLE PRECISION,
///     lng DOUBLE PRECISION,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

/// Address row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Address {
    /// Sequence-allocated id
    pub id: i64,

    /// Owning user
    pub user_id: i64,

    /// Free-form address text
    pub address: String,

    /// Optional latitude
    pub lat: Option<f64>,

    /// Optional longitude
    pub lng: Option<f64>,

    /// When the address was recorded
    pub created_at: DateTime<Utc>,
}

/// Input for inserting an address row
///
/// The id must already have been allocated from `address_seq`.
#[derive(Debug, Clone)]
pub struct CreateAddress {
    pub id: i64,
    pub user_id: i64,
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl Address {
    /// Inserts a new address row
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The referenced user does not exist (foreign key violation)
    /// - Database connection fails
    pub async fn insert<'e, E>(executor: E, data: CreateAddress) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let address = sqlx::query_as::<_, Address>(
            r#"
            INSERT INTO addresses (id, user_id, address, lat, lng)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, address, lat, lng, created_at
            "#,
        )
        .bind(data.id)
        .bind(data.user_id)
        .bind(data.address)
        .bind(data.lat)
        .bind(data.lng)
        .fetch_one(executor)
        .await?;

        Ok(address)
    }

    /// Lists addresses, optionally filtered to one user
    ///
    /// Results are ordered by id.
    pub async fn list(pool: &PgPool, user_id: Option<i64>) -> Result<Vec<Self>, sqlx::Error> {
        let addresses = sqlx::query_as::<_, Address>(
            r#"
            SELECT id, user_id, address, lat, lng, created_at
            FROM addresses
            WHERE ($1::bigint IS NULL OR user_id = $1)
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(addresses)
    }
}
