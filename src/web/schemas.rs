//! Request and response bodies of the mini-app API
//!
//! Request fields are optional at the serde level so that a missing field is
//! reported as `Missing <field>` with status 400 instead of a decode failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Ad, AdFilter, NewAd, DEFAULT_CONTACT_PREFERENCE};

use super::error::ApiError;

/// Query string of `GET /api/ads`
#[derive(Debug, Default, Deserialize)]
pub struct AdsQuery {
    pub category: Option<String>,
    /// Internal user id of the owner
    pub user_id: Option<i64>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<AdsQuery> for AdFilter {
    fn from(query: AdsQuery) -> Self {
        AdFilter {
            category: query.category,
            user_id: query.user_id,
            search: query.search,
            limit: query.limit,
            offset: query.offset,
        }
    }
}

/// Query string of `GET /api/ad/{id}`
#[derive(Debug, Default, Deserialize)]
pub struct AdQuery {
    /// Telegram id of the viewer, to report whether the ad is in their favorites
    pub viewer_id: Option<i64>,
}

/// Body of `POST /api/create_ad`
#[derive(Debug, Default, Deserialize)]
pub struct CreateAdRequest {
    /// Telegram id of the author
    pub user_id: Option<i64>,
    pub title: Option<String>,
    pub price: Option<Value>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub photos: Option<Vec<String>>,
    pub location: Option<String>,
    pub contact_preference: Option<String>,
}

impl CreateAdRequest {
    /// Check required fields and cast the price; returns the author's Telegram id and the draft
    pub fn validate(self) -> Result<(i64, NewAd), ApiError> {
        let user_id = self.user_id.ok_or(ApiError::MissingField("user_id"))?;
        let title = self.title.ok_or(ApiError::MissingField("title"))?;
        let price = self.price.ok_or(ApiError::MissingField("price"))?;
        let category = self.category.ok_or(ApiError::MissingField("category"))?;

        let price = cast_price(&price)
            .ok_or_else(|| ApiError::BadRequest("Invalid price".to_string()))?;

        let ad = NewAd {
            title,
            description: self.description.unwrap_or_default(),
            price,
            category,
            photos: self.photos.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            contact_preference: self
                .contact_preference
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CONTACT_PREFERENCE.to_string()),
        };
        ad.validate()?;

        Ok((user_id, ad))
    }
}

/// Cast a JSON number or numeric string to a price
pub fn cast_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
    .filter(|price| price.is_finite())
}

/// Body of `POST /api/toggle_favorite` and `POST /api/delete_ad`
#[derive(Debug, Default, Deserialize)]
pub struct AdActionRequest {
    /// Telegram id of the acting user
    pub user_id: Option<i64>,
    pub ad_id: Option<i64>,
}

impl AdActionRequest {
    /// Returns (Telegram id, ad id)
    pub fn validate(self) -> Result<(i64, i64), ApiError> {
        let user_id = self.user_id.ok_or(ApiError::MissingField("user_id"))?;
        let ad_id = self.ad_id.ok_or(ApiError::MissingField("ad_id"))?;
        Ok((user_id, ad_id))
    }
}

/// A single ad, optionally annotated for the viewer
#[derive(Debug, Serialize)]
pub struct AdDetail {
    #[serde(flatten)]
    pub ad: Ad,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAdResponse {
    pub success: bool,
    pub ad_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleFavoriteResponse {
    pub success: bool,
    pub is_favorite: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteAdResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadPhotoResponse {
    pub success: bool,
    pub url: String,
}
