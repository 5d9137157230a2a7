/// Database models for Rideline
///
/// This module contains the database models and their CRUD operations.
///
/// # Models
///
/// - `user`: Rider and passenger accounts
/// - `address`: Addresses attached to a user
/// - `rider_vehicle`: Vehicle records attached to rider accounts
///
/// # Example
///
/// ```no_run
/// use rideline_shared::models::user::User;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// if let Some(user) = User::find_by_phone(&pool, "0800000001").await? {
///     println!("Found user: {}", user.name);
/// }
/// # Ok(())
/// # }
/// ```

pub mod address;
pub mod rider_vehicle;
pub mod user;
