/// Address endpoints
///
/// # Endpoints
///
/// - `POST /addresses` - Create an address (user id in the body)
/// - `POST /users/:id/addresses` - Create an address for the path user
/// - `GET /addresses?user_id=...` - List addresses, optionally filtered

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rideline_shared::models::address::Address;
use rideline_shared::registrar::NewAddress;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Create address request (standalone route)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAddressRequest {
    /// Owning user
    pub user_id: Option<i64>,

    /// Free-form address text
    pub address: Option<String>,

    /// Optional latitude
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub lat: Option<f64>,

    /// Optional longitude
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub lng: Option<f64>,
}

/// Create address request (nested under /users/:id)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserAddressRequest {
    pub address: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub lat: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub lng: Option<f64>,
}

/// Query parameters for listing addresses
#[derive(Debug, Deserialize)]
pub struct ListAddressesQuery {
    /// Restrict to one user's addresses
    pub user_id: Option<i64>,
}

/// Listing response
#[derive(Debug, Serialize)]
pub struct ListAddressesResponse {
    pub items: Vec<Address>,
    pub count: usize,
}

/// Create an address
///
/// # Endpoint
///
/// ```text
/// POST /addresses
/// Content-Type: application/json
///
/// {
///   "user_id": 42,
///   "address": "Jl. Sudirman No. 1",
///   "lat": -6.2088,
///   "lng": 106.8456
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing/invalid fields
/// - `404 Not Found`: Referenced user does not exist
pub async fn create_address(
    State(state): State<AppState>,
    Json(req): Json<CreateAddressRequest>,
) -> ApiResult<(StatusCode, Json<Address>)> {
    req.validate()?;

    let address = state
        .registrar
        .create_address(NewAddress {
            user_id: req.user_id.unwrap_or_default(),
            address: req.address.unwrap_or_default(),
            lat: req.lat,
            lng: req.lng,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(address)))
}

/// Create an address for the user in the path
///
/// Same behavior as [`create_address`] with the owner taken from the URL.
pub async fn create_user_address(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<CreateUserAddressRequest>,
) -> ApiResult<(StatusCode, Json<Address>)> {
    req.validate()?;

    let address = state
        .registrar
        .create_address(NewAddress {
            user_id,
            address: req.address.unwrap_or_default(),
            lat: req.lat,
            lng: req.lng,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(address)))
}

/// List addresses, optionally filtered to one user
///
/// # Endpoint
///
/// ```text
/// GET /addresses?user_id=42
/// ```
///
/// Returns `{ "items": [...], "count": n }`, ordered by id.
pub async fn list_addresses(
    State(state): State<AppState>,
    Query(query): Query<ListAddressesQuery>,
) -> ApiResult<Json<ListAddressesResponse>> {
    let items = Address::list(&state.db, query.user_id).await?;
    let count = items.len();

    Ok(Json(ListAddressesResponse { items, count }))
}
