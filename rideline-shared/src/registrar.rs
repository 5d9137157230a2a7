/// Registration service: entity creation with duplicate guarding
///
/// The `Registrar` composes the sequence allocator, the duplicate-phone
/// guard, and the models into the creation workflows: passengers, riders
/// (user + vehicle), addresses, and partial user updates. Route handlers call
/// it and translate its error type to HTTP responses.
///
/// # Uniqueness
///
/// Phone numbers are unique across users. The registrar checks before
/// writing so conflicts can report who owns the number; the store's unique
/// index on `users.phone` catches the remaining check-then-write race, and a
/// violation from the insert is folded back into the same structured
/// [`RegistrarError::PhoneTaken`].
///
/// # Example
///
/// ```no_run
/// use rideline_shared::registrar::{NewUser, Registrar};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let registrar = Registrar::new(pool);
///
/// let user = registrar.create_user(NewUser {
///     name: "Ana".to_string(),
///     password: "secret".to_string(),
///     phone: "0800000001".to_string(),
///     picture: None,
///     role: None, // defaults to passenger
/// }).await?;
///
/// assert_eq!(user.role, 0);
/// # Ok(())
/// # }
/// ```

use crate::auth::password::{hash_password, PasswordError};
use crate::db::sequence::{SequenceAllocator, SequenceError, ADDRESS_SEQ, RIDER_SEQ, USER_SEQ};
use crate::models::address::{Address, CreateAddress};
use crate::models::rider_vehicle::{CreateRiderVehicle as VehicleRecord, RiderVehicle};
use crate::models::user::{CreateUser as UserRecord, UpdateUser, User, UserRole};
use sqlx::PgPool;
use tracing::info;

/// Error type for registration operations
#[derive(Debug, thiserror::Error)]
pub enum RegistrarError {
    /// Missing or malformed input
    #[error("{0}")]
    InvalidArgument(String),

    /// The phone number is already registered; carries the owning record
    #[error("phone {phone} is already registered to user {id} ({name})")]
    PhoneTaken {
        id: i64,
        name: String,
        phone: String,
    },

    /// A referenced user does not exist
    #[error("user {0} not found")]
    UserNotFound(i64),

    /// Password hashing failed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Id allocation failed
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// Any other database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub password: String,
    pub phone: String,
    pub picture: Option<String>,

    /// Role code; None defaults to passenger (0)
    pub role: Option<i16>,
}

/// Input for creating an address
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub user_id: i64,
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Input for creating a rider vehicle
#[derive(Debug, Clone)]
pub struct NewRiderVehicle {
    pub user_id: i64,
    pub image_car: Option<String>,
    pub plate_number: String,
    pub car_type: String,
}

/// Input for the composite rider registration
#[derive(Debug, Clone)]
pub struct NewRider {
    pub name: String,
    pub password: String,
    pub phone: String,
    pub picture: Option<String>,
    pub image_car: Option<String>,
    pub plate_number: String,
    pub car_type: String,
}

/// Input for partially updating a user
///
/// Only name, password, phone, picture, and role may change. `picture` uses
/// the double-Option so `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub picture: Option<Option<String>>,
    pub role: Option<i16>,
}

impl UserPatch {
    /// Whether the patch carries any field at all
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.password.is_none()
            && self.phone.is_none()
            && self.picture.is_none()
            && self.role.is_none()
    }
}

/// Creates users, addresses, and rider vehicles
///
/// Cheap to clone; the pool is reference-counted.
#[derive(Debug, Clone)]
pub struct Registrar {
    pool: PgPool,
    sequences: SequenceAllocator,
}

impl Registrar {
    /// Creates a registrar with its own allocator over the given pool
    pub fn new(pool: PgPool) -> Self {
        let sequences = SequenceAllocator::new(pool.clone());
        Self { pool, sequences }
    }

    /// Creates a user account
    ///
    /// Validates name/password/phone, normalizes the role (None defaults to
    /// passenger), guards the phone number, hashes the password, allocates an
    /// id from `user_seq`, and persists the row.
    ///
    /// # Errors
    ///
    /// - [`RegistrarError::InvalidArgument`] on empty fields or a role
    ///   outside {0, 1}
    /// - [`RegistrarError::PhoneTaken`] if the phone number is registered
    pub async fn create_user(&self, data: NewUser) -> Result<User, RegistrarError> {
        require(&data.name, "name")?;
        require(&data.password, "password")?;
        require(&data.phone, "phone")?;
        let role = normalize_role(data.role)?;

        self.ensure_phone_free(&data.phone, None).await?;

        let password_hash = hash_password(&data.password)?;
        let id = self.sequences.allocate(USER_SEQ).await?;

        let user = match User::insert(
            &self.pool,
            UserRecord {
                id,
                name: data.name,
                password_hash,
                phone: data.phone.clone(),
                picture: data.picture,
                role,
            },
        )
        .await
        {
            Ok(user) => user,
            Err(err) if is_phone_conflict(&err) => {
                return Err(self.phone_taken(&data.phone, err).await)
            }
            Err(err) => return Err(err.into()),
        };

        info!(user_id = user.id, role, "Registered user");
        Ok(user)
    }

    /// Creates an address for an existing user
    ///
    /// # Errors
    ///
    /// - [`RegistrarError::InvalidArgument`] on an empty address or
    ///   non-positive user id
    /// - [`RegistrarError::UserNotFound`] if the referenced user is missing
    pub async fn create_address(&self, data: NewAddress) -> Result<Address, RegistrarError> {
        require_id(data.user_id)?;
        require(&data.address, "address")?;

        User::find_by_id(&self.pool, data.user_id)
            .await?
            .ok_or(RegistrarError::UserNotFound(data.user_id))?;

        let id = self.sequences.allocate(ADDRESS_SEQ).await?;

        let address = Address::insert(
            &self.pool,
            CreateAddress {
                id,
                user_id: data.user_id,
                address: data.address,
                lat: data.lat,
                lng: data.lng,
            },
        )
        .await
        .map_err(|e| fold_missing_user(e, data.user_id))?;

        info!(address_id = address.id, user_id = address.user_id, "Created address");
        Ok(address)
    }

    /// Creates a vehicle record for an existing user
    ///
    /// # Errors
    ///
    /// - [`RegistrarError::InvalidArgument`] on empty plate/type or
    ///   non-positive user id
    /// - [`RegistrarError::UserNotFound`] if the referenced user is missing
    pub async fn create_rider_vehicle(
        &self,
        data: NewRiderVehicle,
    ) -> Result<RiderVehicle, RegistrarError> {
        require_id(data.user_id)?;
        require(&data.plate_number, "plate_number")?;
        require(&data.car_type, "car_type")?;

        let id = self.sequences.allocate(RIDER_SEQ).await?;

        let vehicle = RiderVehicle::insert(
            &self.pool,
            VehicleRecord {
                id,
                user_id: data.user_id,
                image_car: data.image_car,
                plate_number: data.plate_number,
                car_type: data.car_type,
            },
        )
        .await
        .map_err(|e| fold_missing_user(e, data.user_id))?;

        info!(vehicle_id = vehicle.id, user_id = vehicle.user_id, "Created rider vehicle");
        Ok(vehicle)
    }

    /// Registers a rider: a role-1 user plus their vehicle, atomically
    ///
    /// Both rows are written in one transaction, so a failed vehicle insert
    /// never leaves a dangling user. Ids allocated for an aborted
    /// registration are burned; the sequences tolerate gaps.
    ///
    /// # Errors
    ///
    /// As [`Registrar::create_user`] plus vehicle-field validation
    pub async fn register_rider(
        &self,
        data: NewRider,
    ) -> Result<(User, RiderVehicle), RegistrarError> {
        require(&data.name, "name")?;
        require(&data.password, "password")?;
        require(&data.phone, "phone")?;
        require(&data.plate_number, "plate_number")?;
        require(&data.car_type, "car_type")?;

        self.ensure_phone_free(&data.phone, None).await?;

        let password_hash = hash_password(&data.password)?;
        let user_id = self.sequences.allocate(USER_SEQ).await?;
        let vehicle_id = self.sequences.allocate(RIDER_SEQ).await?;

        let mut tx = self.pool.begin().await?;

        let user = match User::insert(
            &mut *tx,
            UserRecord {
                id: user_id,
                name: data.name,
                password_hash,
                phone: data.phone.clone(),
                picture: data.picture,
                role: UserRole::Rider.code(),
            },
        )
        .await
        {
            Ok(user) => user,
            Err(err) if is_phone_conflict(&err) => {
                drop(tx);
                return Err(self.phone_taken(&data.phone, err).await);
            }
            Err(err) => return Err(err.into()),
        };

        let vehicle = RiderVehicle::insert(
            &mut *tx,
            VehicleRecord {
                id: vehicle_id,
                user_id,
                image_car: data.image_car,
                plate_number: data.plate_number,
                car_type: data.car_type,
            },
        )
        .await?;

        tx.commit().await?;

        info!(user_id = user.id, vehicle_id = vehicle.id, "Registered rider");
        Ok((user, vehicle))
    }

    /// Partially updates a user
    ///
    /// Allowed fields: name, password, phone, picture, role. Provided fields
    /// must still be valid (non-empty, role in {0, 1}); a new phone number is
    /// guarded against every other user.
    ///
    /// # Errors
    ///
    /// - [`RegistrarError::InvalidArgument`] on an empty patch or invalid
    ///   field values
    /// - [`RegistrarError::UserNotFound`] if the user is missing
    /// - [`RegistrarError::PhoneTaken`] if the new phone belongs to someone
    ///   else
    pub async fn update_user(&self, id: i64, patch: UserPatch) -> Result<User, RegistrarError> {
        if patch.is_empty() {
            return Err(RegistrarError::InvalidArgument(
                "no updatable fields provided".to_string(),
            ));
        }
        if let Some(ref name) = patch.name {
            require(name, "name")?;
        }
        if let Some(ref password) = patch.password {
            require(password, "password")?;
        }
        if let Some(ref phone) = patch.phone {
            require(phone, "phone")?;
            self.ensure_phone_free(phone, Some(id)).await?;
        }
        let role = match patch.role {
            Some(code) => Some(normalize_role(Some(code))?),
            None => None,
        };

        let password_hash = match patch.password {
            Some(ref password) => Some(hash_password(password)?),
            None => None,
        };

        let phone = patch.phone.clone();
        let updated = match User::update(
            &self.pool,
            id,
            UpdateUser {
                name: patch.name,
                password_hash,
                phone: patch.phone,
                picture: patch.picture,
                role,
            },
        )
        .await
        {
            Ok(user) => user,
            Err(err) if is_phone_conflict(&err) => {
                let phone = phone.as_deref().unwrap_or_default();
                return Err(self.phone_taken(phone, err).await);
            }
            Err(err) => return Err(err.into()),
        };

        let user = updated.ok_or(RegistrarError::UserNotFound(id))?;

        info!(user_id = user.id, "Updated user");
        Ok(user)
    }

    /// Duplicate guard: fails if the phone number belongs to a user other
    /// than `exclude`
    ///
    /// The returned conflict carries the owning record's id, name, and phone
    /// so callers can show who holds the number.
    pub async fn ensure_phone_free(
        &self,
        phone: &str,
        exclude: Option<i64>,
    ) -> Result<(), RegistrarError> {
        let existing = User::find_by_phone(&self.pool, phone).await?;

        match existing {
            Some(owner) if Some(owner.id) != exclude => Err(RegistrarError::PhoneTaken {
                id: owner.id,
                name: owner.name,
                phone: owner.phone,
            }),
            _ => Ok(()),
        }
    }

    /// Builds the structured conflict after the unique index caught a race
    /// the guard missed
    async fn phone_taken(&self, phone: &str, err: sqlx::Error) -> RegistrarError {
        match User::find_by_phone(&self.pool, phone).await {
            Ok(Some(owner)) => RegistrarError::PhoneTaken {
                id: owner.id,
                name: owner.name,
                phone: owner.phone,
            },
            _ => RegistrarError::Database(err),
        }
    }
}

/// Validates a required text field
fn require(value: &str, field: &str) -> Result<(), RegistrarError> {
    if value.trim().is_empty() {
        Err(RegistrarError::InvalidArgument(format!(
            "{field} must not be empty"
        )))
    } else {
        Ok(())
    }
}

/// Validates a referenced user id
fn require_id(user_id: i64) -> Result<(), RegistrarError> {
    if user_id <= 0 {
        Err(RegistrarError::InvalidArgument(
            "user_id must be a positive id".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Normalizes an optional role code; None defaults to passenger
fn normalize_role(role: Option<i16>) -> Result<i16, RegistrarError> {
    let code = role.unwrap_or_else(|| UserRole::Passenger.code());
    match UserRole::from_code(code) {
        Some(role) => Ok(role.code()),
        None => Err(RegistrarError::InvalidArgument(format!(
            "role must be 0 (passenger) or 1 (rider), got {code}"
        ))),
    }
}

/// Whether a database error is the unique index on users.phone
fn is_phone_conflict(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.constraint() == Some("users_phone_key")
    )
}

/// Maps a foreign-key violation on a user_id column to UserNotFound
fn fold_missing_user(err: sqlx::Error, user_id: i64) -> RegistrarError {
    match &err {
        sqlx::Error::Database(db_err)
            if db_err
                .constraint()
                .is_some_and(|c| c.ends_with("user_id_fkey")) =>
        {
            RegistrarError::UserNotFound(user_id)
        }
        _ => RegistrarError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_rejects_empty_and_blank() {
        assert!(require("", "name").is_err());
        assert!(require("   ", "name").is_err());
        assert!(require("Ana", "name").is_ok());
    }

    #[test]
    fn test_require_error_names_the_field() {
        let err = require("", "plate_number").unwrap_err();
        assert_eq!(err.to_string(), "plate_number must not be empty");
    }

    #[test]
    fn test_role_defaults_to_passenger() {
        assert_eq!(normalize_role(None).unwrap(), 0);
    }

    #[test]
    fn test_role_codes_validated() {
        assert_eq!(normalize_role(Some(0)).unwrap(), 0);
        assert_eq!(normalize_role(Some(1)).unwrap(), 1);
        assert!(normalize_role(Some(2)).is_err());
        assert!(normalize_role(Some(-1)).is_err());
    }

    #[test]
    fn test_user_patch_emptiness() {
        assert!(UserPatch::default().is_empty());
        assert!(!UserPatch {
            phone: Some("0800000001".to_string()),
            ..Default::default()
        }
        .is_empty());
    }
}
