use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use pastetrail_common::{AppConfig, Point};
use pastetrail_domains::designs::Design;
use pastetrail_domains::logging::{self, CapturedPhoto, DesignChoice, LogSession, StickerChoice};
use pastetrail_domains::matching;
use pastetrail_domains::photos::PhotoStore;
use pastetrail_domains::search;
use pastetrail_domains::sightings::Sighting;
use pastetrail_domains::stickers::Sticker;
use pastetrail_domains::users::User;

use crate::auth::{self, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::photos::content_type_for;

pub struct AppState {
    pub pool: PgPool,
    pub photos: Arc<dyn PhotoStore>,
    pub config: AppConfig,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = if state.config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = state
            .config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/health", get(health))
        // Auth
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Photos
        .route("/photos", post(upload_photo))
        .route("/photos/{key}", get(get_photo))
        // Designs
        .route("/designs", get(list_designs).post(create_design))
        .route("/designs/search", get(design_search))
        .route("/designs/{id}", get(design_detail))
        .route("/designs/{id}/stickers", get(design_stickers))
        .route("/designs/{id}/sightings", get(design_sightings))
        // Users
        .route("/users/search", get(user_search))
        .route("/users/{id}", get(user_detail))
        .route("/users/{id}/sightings", get(user_sightings))
        .route("/users/{id}/designs", get(user_designs))
        // Stickers
        .route("/stickers", get(list_stickers))
        .route("/stickers/{id}", get(sticker_detail))
        .route("/stickers/{id}/sightings", get(sticker_sightings))
        // Sighting submission (the logging pipeline's terminal step)
        .route("/sightings", post(submit_sighting))
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

// --- Query structs ---

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

#[derive(Deserialize)]
struct NearQuery {
    lat: Option<f64>,
    lng: Option<f64>,
    radius: Option<f64>,
}

// --- Photos ---

async fn upload_photo(
    State(state): State<Arc<AppState>>,
    AuthUser(_user_id): AuthUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Value>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("photo") {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("unreadable photo field: {e}")))?;

        let key = state.photos.put(&bytes, &content_type).await?;
        return Ok((
            StatusCode::CREATED,
            Json(json!({ "key": key, "url": format!("/photos/{key}") })),
        ));
    }

    Err(ApiError::BadRequest("no photo provided".to_string()))
}

async fn get_photo(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let bytes = state.photos.get(&key).await?;
    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&key).to_string()),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        bytes,
    ))
}

// --- Designs ---

async fn list_designs(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Design>>> {
    let designs = Design::list_recent(100, &state.pool).await?;
    Ok(Json(designs))
}

#[derive(Deserialize)]
struct CreateDesignRequest {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    image_url: String,
}

async fn create_design(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CreateDesignRequest>,
) -> ApiResult<(StatusCode, Json<Design>)> {
    let design = Design::create(
        &req.name,
        &req.description,
        &req.text,
        &req.image_url,
        user_id,
        &state.pool,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(design)))
}

async fn design_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Design>>> {
    let designs = search::search_designs(params.q.as_deref().unwrap_or(""), &state.pool).await?;
    Ok(Json(designs))
}

async fn design_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let design = Design::find_with_creator(id, &state.pool).await?;
    Ok(Json(json!(design)))
}

/// Without coordinates: every placement of the design, newest first. With
/// `lat`/`lng`: the candidate-matcher view, closest-first within the
/// threshold.
async fn design_stickers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<NearQuery>,
) -> ApiResult<Json<Value>> {
    if let (Some(lat), Some(lng)) = (params.lat, params.lng) {
        let threshold = params
            .radius
            .unwrap_or(state.config.nearby_threshold_meters);
        let candidates =
            matching::find_nearby_stickers(id, Point::new(lat, lng), threshold, &state.pool)
                .await?;
        return Ok(Json(json!(candidates)));
    }

    let stickers = Sticker::list_for_design(id, &state.pool).await?;
    Ok(Json(json!(stickers)))
}

async fn design_sightings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Sighting>>> {
    let sightings = Sighting::list_for_design(id, &state.pool).await?;
    Ok(Json(sightings))
}

// --- Users ---

async fn user_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<Value>> {
    let users = search::search_users(params.q.as_deref().unwrap_or(""), &state.pool).await?;
    Ok(Json(json!(users)))
}

async fn user_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(id, &state.pool).await?;
    Ok(Json(user))
}

async fn user_sightings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let sightings = Sighting::list_for_user(id, &state.pool).await?;
    Ok(Json(json!(sightings)))
}

async fn user_designs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Design>>> {
    let designs = Design::list_by_creator(id, &state.pool).await?;
    Ok(Json(designs))
}

// --- Stickers ---

/// The map feed: every placement across all designs, newest first.
async fn list_stickers(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Sticker>>> {
    let stickers = Sticker::list_recent(500, &state.pool).await?;
    Ok(Json(stickers))
}

async fn sticker_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let detail = Sticker::find_detail(id, &state.pool).await?;
    Ok(Json(json!(detail)))
}

async fn sticker_sightings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Sighting>>> {
    let sightings = Sighting::list_for_sticker(id, &state.pool).await?;
    Ok(Json(sightings))
}

// --- Sighting submission ---

#[derive(Deserialize)]
struct SubmitRequest {
    latitude: Option<f64>,
    longitude: Option<f64>,
    design: DesignChoice,
    /// `None` asks the server to run the candidate matcher; with candidates
    /// present the request is rejected with 409 so the user can decide.
    sticker: Option<StickerChoice>,
    #[serde(default)]
    location_description: String,
    #[serde(default)]
    note: String,
}

/// Multipart body: a `photo` file field plus a `data` JSON field carrying
/// [`SubmitRequest`].
async fn submit_sighting(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut photo: Option<CapturedPhoto> = None;
    let mut request: Option<SubmitRequest> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("photo") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("image/jpeg")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("unreadable photo field: {e}")))?;
                photo = Some(CapturedPhoto {
                    bytes: bytes.to_vec(),
                    content_type,
                });
            }
            Some("data") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("unreadable data field: {e}")))?;
                request = Some(
                    serde_json::from_str(&text)
                        .map_err(|e| ApiError::BadRequest(format!("invalid data field: {e}")))?,
                );
            }
            _ => {}
        }
    }

    let photo = photo.ok_or_else(|| ApiError::BadRequest("no photo provided".to_string()))?;
    let request = request.ok_or_else(|| ApiError::BadRequest("no data provided".to_string()))?;

    let location = match (request.latitude, request.longitude) {
        (Some(lat), Some(lng)) => Some(Point::new(lat, lng)),
        _ => None,
    };

    let mut session = LogSession::capture(photo, location, state.config.fallback_point());
    session.set_location_description(request.location_description);
    session.set_note(request.note);
    session.choose_design(request.design);

    match request.sticker {
        Some(choice) => session.choose_sticker(choice),
        None => {
            // Server-side resolution step: a brand-new design has no
            // placements, so only an existing design can have candidates.
            let candidates = match &session.design {
                Some(DesignChoice::Existing(design_id)) => {
                    matching::find_nearby_stickers(
                        *design_id,
                        session.location,
                        state.config.nearby_threshold_meters,
                        &state.pool,
                    )
                    .await?
                }
                _ => Vec::new(),
            };
            if !session.resolve_from_candidates(&candidates) {
                return Ok((
                    StatusCode::CONFLICT,
                    Json(json!({
                        "error": "nearby placements of this design exist; choose one or create new",
                        "candidates": candidates,
                    })),
                ));
            }
        }
    }

    let submission = logging::submit(
        &session,
        user_id,
        state.photos.as_ref(),
        state.config.nearby_threshold_meters,
        &state.pool,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(json!(submission))))
}
