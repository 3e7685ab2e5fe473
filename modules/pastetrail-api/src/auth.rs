//! Bearer-token auth: HMAC-SHA256 signed `user_id|expiry|sig` tokens.
//!
//! The core treats the resolved user id as already authenticated; this
//! module is the collaborator that resolves it.

use std::sync::Arc;

use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::Json;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;

use pastetrail_domains::users::{hash_password, verify_password, User};

use crate::error::{ApiError, ApiResult};
use crate::routes::AppState;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_DURATION_SECS: i64 = 30 * 24 * 3600;

/// Create a signed bearer token for `user_id`.
pub fn create_token(user_id: Uuid, secret: &str) -> String {
    let expiry = chrono::Utc::now().timestamp() + TOKEN_DURATION_SECS;
    let payload = format!("{user_id}|{expiry}");
    let sig = sign(&payload, secret);
    format!("{payload}|{sig}")
}

/// Verify a token and return the embedded user id if the signature holds
/// and the token has not expired.
pub fn verify_token(token: &str, secret: &str) -> Option<Uuid> {
    let mut parts = token.splitn(3, '|');
    let user_id = parts.next()?;
    let expiry = parts.next()?;
    let sig = parts.next()?;

    // Mac::verify_slice compares in constant time.
    let sig = hex::decode(sig).ok()?;
    keyed_mac(&format!("{user_id}|{expiry}"), secret)
        .verify_slice(&sig)
        .ok()?;

    let expiry: i64 = expiry.parse().ok()?;
    if chrono::Utc::now().timestamp() > expiry {
        return None;
    }

    user_id.parse().ok()
}

fn sign(payload: &str, secret: &str) -> String {
    hex::encode(keyed_mac(payload, secret).finalize().into_bytes())
}

fn keyed_mac(payload: &str, secret: &str) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    mac
}

/// Authenticated caller. Extract this in handlers that require an actor.
pub struct AuthUser(pub Uuid);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        let token = header.strip_prefix("Bearer ").unwrap_or("");
        verify_token(token, &state.config.session_secret)
            .map(AuthUser)
            .ok_or(ApiError::Unauthorized)
    }
}

// --- Handlers ---

#[derive(Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password);
    let user = User::create(&req.username, &req.email, &password_hash, &state.pool).await?;
    let token = create_token(user.id, &state.config.session_secret);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "token": token, "user": user })),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let user = User::find_by_username(&req.username, &state.pool)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let token = create_token(user.id, &state.config.session_secret);
    Ok(Json(json!({ "token": token, "user": user })))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(user_id, &state.pool).await?;
    Ok(Json(user))
}
