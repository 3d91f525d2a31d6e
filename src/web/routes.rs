use std::sync::Arc;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{Path, Query, State},
    Json,
};
use tracing::{debug, info};

use crate::config::WebConfig;
use crate::db::Store;
use crate::models::{Ad, AdFilter, Category, PublicUser, User, UserStats};

use super::error::ApiError;
use super::schemas::{
    AdActionRequest, AdDetail, AdQuery, AdsQuery, CreateAdRequest, CreateAdResponse,
    DeleteAdResponse, ToggleFavoriteResponse, UploadPhotoResponse,
};

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<WebConfig>,
}

impl AppState {
    pub fn new(store: Store, config: WebConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

async fn require_user(store: &Store, telegram_id: i64) -> Result<User, ApiError> {
    store
        .get_user_by_telegram_id(telegram_id)
        .await?
        .ok_or(ApiError::NotFound("User"))
}

// ── Handlers ────────────────────────────────────────────────────────────

/// GET /api/ads: active ads, filtered and paginated.
pub async fn list_ads(
    State(state): State<AppState>,
    query: Result<Query<AdsQuery>, QueryRejection>,
) -> Result<Json<Vec<Ad>>, ApiError> {
    let Query(query) = query?;
    let filter = AdFilter::from(query);
    debug!(filter = ?filter, "Listing ads");

    let ads = state.store.list_ads(&filter).await?;
    Ok(Json(ads))
}

/// GET /api/ad/{id}: one ad; counts a view.
pub async fn get_ad(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<AdQuery>, QueryRejection>,
) -> Result<Json<AdDetail>, ApiError> {
    let Path(ad_id) = path?;
    let Query(query) = query?;

    let ad = state
        .store
        .get_ad(ad_id)
        .await?
        .ok_or(ApiError::NotFound("Ad"))?;

    let is_favorite = match query.viewer_id {
        Some(viewer_id) => match state.store.get_user_by_telegram_id(viewer_id).await? {
            Some(viewer) => Some(state.store.is_favorite(viewer.id, ad_id).await?),
            None => Some(false),
        },
        None => None,
    };

    Ok(Json(AdDetail { ad, is_favorite }))
}

/// POST /api/create_ad: publish a new ad for a registered user.
pub async fn create_ad(
    State(state): State<AppState>,
    payload: Result<Json<CreateAdRequest>, JsonRejection>,
) -> Result<Json<CreateAdResponse>, ApiError> {
    let Json(req) = payload?;
    let (telegram_id, new_ad) = req.validate()?;

    let user = require_user(&state.store, telegram_id).await?;
    let ad_id = state
        .store
        .create_ad(user.id, &new_ad)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Ad could not be created".to_string()))?;

    info!(user_id = user.id, ad_id, "Ad published from mini app");
    Ok(Json(CreateAdResponse {
        success: true,
        ad_id,
    }))
}

/// GET /api/user/{telegram_id}: public profile.
pub async fn get_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<PublicUser>, ApiError> {
    let Path(telegram_id) = path?;
    let user = require_user(&state.store, telegram_id).await?;
    Ok(Json(PublicUser::from(user)))
}

/// POST /api/toggle_favorite: add or remove a bookmark.
pub async fn toggle_favorite(
    State(state): State<AppState>,
    payload: Result<Json<AdActionRequest>, JsonRejection>,
) -> Result<Json<ToggleFavoriteResponse>, ApiError> {
    let Json(req) = payload?;
    let (telegram_id, ad_id) = req.validate()?;

    let user = require_user(&state.store, telegram_id).await?;
    let is_favorite = state
        .store
        .toggle_favorite(user.id, ad_id)
        .await?
        .ok_or(ApiError::NotFound("Ad"))?;

    Ok(Json(ToggleFavoriteResponse {
        success: true,
        is_favorite,
    }))
}

/// GET /api/user_favorites/{telegram_id}: bookmarked ads; unknown users have none.
pub async fn user_favorites(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<Ad>>, ApiError> {
    let Path(telegram_id) = path?;

    let favorites = match state.store.get_user_by_telegram_id(telegram_id).await? {
        Some(user) => state.store.get_user_favorites(user.id).await?,
        None => Vec::new(),
    };

    Ok(Json(favorites))
}

/// GET /api/categories
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.store.list_categories().await?))
}

/// POST /api/delete_ad: deactivate one of the caller's ads.
pub async fn delete_ad(
    State(state): State<AppState>,
    payload: Result<Json<AdActionRequest>, JsonRejection>,
) -> Result<Json<DeleteAdResponse>, ApiError> {
    let Json(req) = payload?;
    let (telegram_id, ad_id) = req.validate()?;

    let user = require_user(&state.store, telegram_id).await?;
    let success = state.store.delete_ad(user.id, ad_id).await?;

    Ok(Json(DeleteAdResponse { success }))
}

/// GET /api/stats/{telegram_id}
pub async fn stats(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<UserStats>, ApiError> {
    let Path(telegram_id) = path?;
    let user = require_user(&state.store, telegram_id).await?;
    Ok(Json(state.store.get_user_stats(user.id).await?))
}

/// POST /upload_photo: no storage behind it yet, always answers with the placeholder image.
pub async fn upload_photo(State(state): State<AppState>) -> Json<UploadPhotoResponse> {
    debug!("Photo upload stub called");
    Json(UploadPhotoResponse {
        success: true,
        url: state.config.photo_placeholder_url.clone(),
    })
}

/// Any unmatched path under `/api`
pub async fn api_not_found() -> ApiError {
    ApiError::NotFound("Endpoint")
}

/// A known path called with the wrong method
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
