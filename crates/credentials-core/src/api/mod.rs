//! REST API for credentials-core
//!
//! | Method | Path                  | Credential                 |
//! |--------|-----------------------|----------------------------|
//! | GET    | `/api/healthz`        | none                       |
//! | POST   | `/api/users`          | none                       |
//! | PUT    | `/api/users`          | `Bearer <access>`          |
//! | POST   | `/api/login`          | none                       |
//! | POST   | `/api/refresh`        | `Bearer <refresh>`         |
//! | POST   | `/api/revoke`         | `Bearer <refresh>`         |
//! | POST   | `/api/chirps`         | `Bearer <access>`          |
//! | GET    | `/api/chirps/:id`     | none                       |
//! | DELETE | `/api/chirps/:id`     | `Bearer <access>`, owner   |
//! | POST   | `/api/polka/webhooks` | `ApiKey <key>`             |

pub mod error;
pub mod security_headers;

use std::sync::Arc;
use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::debug;
use uuid::Uuid;
use crate::chirps::ChirpService;
use crate::extract::bearer_from_headers;
use crate::store::ChirpStore;
use crate::types::{Chirp, CreateUserRequest, UpdateUserRequest, User};
use crate::{AuthenticationService, Error, Result, UserId};

/// Webhook event that upgrades a user
pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    pub auth_service: Arc<AuthenticationService>,
    pub chirp_service: Arc<ChirpService>,
}

impl ApiState {
    /// Chirp ownership checks go through the authentication service's guard
    pub fn new(auth_service: Arc<AuthenticationService>, chirp_store: Arc<dyn ChirpStore>) -> Self {
        let chirp_service = ChirpService::new(chirp_store, auth_service.guard().clone());
        Self {
            auth_service,
            chirp_service: Arc::new(chirp_service),
        }
    }
}

/// Identity of a caller holding a valid access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

#[async_trait]
impl FromRequestParts<ApiState> for AuthenticatedUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self> {
        state
            .auth_service
            .guard()
            .authenticate_request_headers(&parts.headers)
            .map(AuthenticatedUser)
    }
}

/// Marker for a request carrying the configured webhook `ApiKey`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookCaller;

#[async_trait]
impl FromRequestParts<ApiState> for WebhookCaller {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self> {
        state
            .auth_service
            .guard()
            .authenticate_api_key_headers(&parts.headers)
            .map(|_| WebhookCaller)
    }
}

/// Public view of a user
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub is_chirpy_red: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_chirpy_red: user.is_chirpy_red,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateChirpRequest {
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookRequest {
    pub event: String,
    pub data: WebhookData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookData {
    pub user_id: UserId,
}

/// Create the REST API router
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/healthz", get(health))
        .route("/api/users", post(create_user).put(update_user))
        .route("/api/login", post(login))
        .route("/api/refresh", post(refresh))
        .route("/api/revoke", post(revoke))
        .route("/api/chirps", post(create_chirp))
        .route("/api/chirps/:id", get(get_chirp).delete(delete_chirp))
        .route("/api/polka/webhooks", post(webhook))
        .layer(middleware::from_fn(security_headers::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn create_user(
    State(state): State<ApiState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse> {
    let user = state.auth_service.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

async fn update_user(
    State(state): State<ApiState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    let user = state.auth_service.update_credentials(user_id, request).await?;
    Ok(Json(user.into()))
}

async fn login(
    State(state): State<ApiState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let result = state
        .auth_service
        .authenticate_password(&request.email, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        user: result.user.into(),
        token: result.access_token,
        refresh_token: result.refresh_token,
    }))
}

async fn refresh(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>> {
    let refresh_token = bearer_from_headers(&headers)?;
    let result = state.auth_service.refresh_access_token(refresh_token).await?;
    Ok(Json(TokenResponse { token: result.access_token }))
}

async fn revoke(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<StatusCode> {
    let refresh_token = bearer_from_headers(&headers)?;
    state.auth_service.revoke_refresh_token(refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_chirp(
    State(state): State<ApiState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(request): Json<CreateChirpRequest>,
) -> Result<impl IntoResponse> {
    let chirp = state.chirp_service.create_chirp(user_id, &request.body).await?;
    Ok((StatusCode::CREATED, Json(chirp)))
}

async fn get_chirp(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Chirp>> {
    Ok(Json(state.chirp_service.get_chirp(id).await?))
}

async fn delete_chirp(
    State(state): State<ApiState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.chirp_service.delete_chirp(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn webhook(
    State(state): State<ApiState>,
    _caller: WebhookCaller,
    Json(request): Json<WebhookRequest>,
) -> Result<StatusCode> {
    if request.event != USER_UPGRADED_EVENT {
        debug!("Ignoring webhook event {}", request.event);
        return Ok(StatusCode::NO_CONTENT);
    }

    state.auth_service.upgrade_user(request.data.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
