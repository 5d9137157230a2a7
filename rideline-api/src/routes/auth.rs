/// Registration and login endpoints
///
/// # Endpoints
///
/// - `POST /register/user` (also mounted at `POST /users`) - Register a user,
///   passenger by default
/// - `POST /register/rider` - Register a rider together with their vehicle
/// - `POST /login` - Phone + password check
///
/// Required fields are modeled as optional in the request types: presence is
/// the registrar's contract, so a missing field surfaces as its 400
/// InvalidArgument rather than a deserialization rejection.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use rideline_shared::auth::password;
use rideline_shared::models::{rider_vehicle::RiderVehicle, user::User};
use rideline_shared::registrar::{NewRider, NewUser};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register user request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserRequest {
    /// Display name
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,

    /// Password (stored as an Argon2id hash)
    pub password: Option<String>,

    /// Phone number (must be unique)
    #[validate(length(max = 32, message = "Phone must be at most 32 characters"))]
    pub phone: Option<String>,

    /// Optional profile picture URL
    #[validate(length(max = 512, message = "Picture URL must be at most 512 characters"))]
    pub picture: Option<String>,

    /// Role code: 0 = passenger (default), 1 = rider
    pub role: Option<i16>,
}

/// Register rider request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRiderRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,

    pub password: Option<String>,

    #[validate(length(max = 32, message = "Phone must be at most 32 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 512, message = "Picture URL must be at most 512 characters"))]
    pub picture: Option<String>,

    /// Optional photo URL of the vehicle
    #[validate(length(max = 512, message = "Car image URL must be at most 512 characters"))]
    pub image_car: Option<String>,

    /// License plate
    #[validate(length(max = 32, message = "Plate number must be at most 32 characters"))]
    pub plate_number: Option<String>,

    /// Vehicle type
    #[validate(length(max = 64, message = "Car type must be at most 64 characters"))]
    pub car_type: Option<String>,
}

/// Register rider response: the account and its vehicle record
#[derive(Debug, Serialize)]
pub struct RegisterRiderResponse {
    pub user: User,
    pub rider_car: RiderVehicle,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub phone: Option<String>,
    pub password: Option<String>,
}

/// Login response
///
/// Deliberately a narrow view of the account; the password hash never leaves
/// the server.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub role: i16,
}

/// Register a new user
///
/// Creates a passenger account unless `role: 1` is given.
///
/// # Endpoint
///
/// ```text
/// POST /register/user
/// Content-Type: application/json
///
/// {
///   "name": "Ana",
///   "password": "secret",
///   "phone": "0800000001"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing/invalid fields or role outside {0, 1}
/// - `409 Conflict`: Phone number already registered (response carries the
///   owning record)
pub async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    req.validate()?;

    let user = state
        .registrar
        .create_user(NewUser {
            name: req.name.unwrap_or_default(),
            password: req.password.unwrap_or_default(),
            phone: req.phone.unwrap_or_default(),
            picture: req.picture,
            role: req.role,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Register a new rider with their vehicle
///
/// Creates a role-1 user and the vehicle record referencing it in one
/// transaction, so a rejected vehicle never leaves a dangling account.
///
/// # Endpoint
///
/// ```text
/// POST /register/rider
/// Content-Type: application/json
///
/// {
///   "name": "Budi",
///   "password": "secret",
///   "phone": "0800000002",
///   "plate_number": "B 1234 XYZ",
///   "car_type": "motorcycle"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing/invalid fields
/// - `409 Conflict`: Phone number already registered
pub async fn register_rider(
    State(state): State<AppState>,
    Json(req): Json<RegisterRiderRequest>,
) -> ApiResult<(StatusCode, Json<RegisterRiderResponse>)> {
    req.validate()?;

    let (user, rider_car) = state
        .registrar
        .register_rider(NewRider {
            name: req.name.unwrap_or_default(),
            password: req.password.unwrap_or_default(),
            phone: req.phone.unwrap_or_default(),
            picture: req.picture,
            image_car: req.image_car,
            plate_number: req.plate_number.unwrap_or_default(),
            car_type: req.car_type.unwrap_or_default(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterRiderResponse { user, rider_car }),
    ))
}

/// Login endpoint
///
/// Verifies the phone/password pair against the stored Argon2id hash. An
/// unknown phone and a wrong password produce the same response, so the
/// endpoint doesn't reveal which numbers are registered.
///
/// # Endpoint
///
/// ```text
/// POST /login
/// Content-Type: application/json
///
/// {
///   "phone": "0800000001",
///   "password": "secret"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing phone or password
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let phone = req
        .phone
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("phone is required".to_string()))?;
    let password_input = req
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("password is required".to_string()))?;

    let user = User::find_by_phone(&state.db, &phone)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid phone or password".to_string()))?;

    let valid = password::verify_password(&password_input, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid phone or password".to_string(),
        ));
    }

    Ok(Json(LoginResponse {
        id: user.id,
        name: user.name,
        phone: user.phone,
        role: user.role,
    }))
}
