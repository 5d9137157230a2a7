/// Rider vehicle model and database operations
///
/// A vehicle record is created as part of rider registration and references
/// the rider's user row. In practice each rider has exactly one.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE rider_vehicles (
///     id BIGINT PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     image_car VARCHAR(512),
///     plate_number VARCHAR(32) NOT NULL,
///     car_type VARCHAR(64) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

/// Vehicle row attached to a rider account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RiderVehicle {
    /// Sequence-allocated id
    pub id: i64,

    /// Owning rider
    pub user_id: i64,

    /// Optional photo URL of the vehicle
    pub image_car: Option<String>,

    /// License plate
    pub plate_number: String,

    /// Vehicle type (e.g. "motorcycle", "sedan")
    pub car_type: String,

    /// When the vehicle was recorded
    pub created_at: DateTime<Utc>,
}

/// Input for inserting a vehicle row
///
/// The id must already have been allocated from `rider_seq`.
#[derive(Debug, Clone)]
pub struct CreateRiderVehicle {
    pub id: i64,
    pub user_id: i64,
    pub image_car: Option<String>,
    pub plate_number: String,
    pub car_type: String,
}

impl RiderVehicle {
    /// Inserts a new vehicle row
    ///
    /// Takes any Postgres executor so rider registration can write the user
    /// and the vehicle in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The referenced user does not exist (foreign key violation)
    /// - Database connection fails
    pub async fn insert<'e, E>(executor: E, data: CreateRiderVehicle) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let vehicle = sqlx::query_as::<_, RiderVehicle>(
            r#"
            INSERT INTO rider_vehicles (id, user_id, image_car, plate_number, car_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, image_car, plate_number, car_type, created_at
            "#,
        )
        .bind(data.id)
        .bind(data.user_id)
        .bind(data.image_car)
        .bind(data.plate_number)
        .bind(data.car_type)
        .fetch_one(executor)
        .await?;

        Ok(vehicle)
    }

    /// Lists vehicles belonging to a user, ordered by id
    pub async fn list_by_user(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let vehicles = sqlx::query_as::<_, RiderVehicle>(
            r#"
            SELECT id, user_id, image_car, plate_number, car_type, created_at
            FROM rider_vehicles
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(vehicles)
    }
}
