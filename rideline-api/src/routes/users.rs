/// User CRUD endpoints
///
/// # Endpoints
///
/// - `GET /users` - List users, paged by `limit`/`startAfter`
/// - `GET /users/:id` - Fetch by id
/// - `GET /users/by-phone/:phone` - Fetch by phone
/// - `PATCH /users/:id` - Partial update (name, password, phone, picture, role)
/// - `DELETE /users/:id` - Delete, cascading to addresses and vehicles
///
/// Creation lives in `routes::auth` (registration); `POST /users` is mounted
/// onto the same handler.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use rideline_shared::models::user::User;
use rideline_shared::registrar::UserPatch;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default page size for listings
const DEFAULT_LIMIT: i64 = 20;

/// Largest page a single request may ask for
const MAX_LIMIT: i64 = 100;

/// Query parameters for listing users
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    /// Maximum number of users to return (default 20, capped at 100)
    pub limit: Option<i64>,

    /// Id cursor: only users with a larger id are returned
    #[serde(rename = "startAfter")]
    pub start_after: Option<i64>,
}

/// Paged listing response
#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    pub items: Vec<User>,
    pub count: usize,
}

/// Partial update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,

    pub password: Option<String>,

    #[validate(length(max = 32, message = "Phone must be at most 32 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 512, message = "Picture URL must be at most 512 characters"))]
    pub picture: Option<String>,

    pub role: Option<i16>,
}

/// Deletion result
#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub ok: bool,
}

/// List users with keyset pagination
///
/// # Endpoint
///
/// ```text
/// GET /users?limit=20&startAfter=42
/// ```
///
/// Returns `{ "items": [...], "count": n }`, ordered by id. Pass the last
/// id of a page as `startAfter` to fetch the next one.
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<ListUsersResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let items = User::list(&state.db, limit, query.start_after).await?;
    let count = items.len();

    Ok(Json(ListUsersResponse { items, count }))
}

/// Fetch a user by id
///
/// # Errors
///
/// - `404 Not Found`: No user with that id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))?;

    Ok(Json(user))
}

/// Fetch a user by phone number
///
/// # Errors
///
/// - `404 Not Found`: No user with that phone
pub async fn get_user_by_phone(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_phone(&state.db, &phone)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No user with phone {}", phone)))?;

    Ok(Json(user))
}

/// Partially update a user
///
/// Only name, password, phone, picture, and role can change. A new password
/// is re-hashed; a new phone is checked against every other user.
///
/// # Endpoint
///
/// ```text
/// PATCH /users/42
/// Content-Type: application/json
///
/// { "name": "New Name", "role": 1 }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Empty patch or invalid field values
/// - `404 Not Found`: No user with that id
/// - `409 Conflict`: New phone belongs to another user
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;

    let user = state
        .registrar
        .update_user(
            id,
            UserPatch {
                name: req.name,
                password: req.password,
                phone: req.phone,
                picture: req.picture.map(Some),
                role: req.role,
            },
        )
        .await?;

    Ok(Json(user))
}

/// Delete a user
///
/// Addresses and vehicle records owned by the user are removed with it.
///
/// # Errors
///
/// - `404 Not Found`: No user with that id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteUserResponse>> {
    let deleted = User::delete(&state.db, id).await?;

    if !deleted {
        return Err(ApiError::NotFound(format!("User {} not found", id)));
    }

    Ok(Json(DeleteUserResponse { ok: true }))
}
