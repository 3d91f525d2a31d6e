//! # Marketplace Data Model
//!
//! Row and value types shared by the store and both front-ends.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Contact preference stored when an ad does not specify one
pub const DEFAULT_CONTACT_PREFERENCE: &str = "telegram";

/// A registered marketplace user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: NaiveDateTime,
}

/// First and last name joined, skipping blank parts; falls back to the username
fn compose_display_name(
    first_name: Option<&str>,
    last_name: Option<&str>,
    username: Option<&str>,
) -> Option<String> {
    let full = [first_name, last_name]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if !full.is_empty() {
        Some(full)
    } else {
        username
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }
}

impl User {
    /// Display name assembled from first and last name, falling back to the username
    pub fn display_name(&self) -> String {
        compose_display_name(
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            self.username.as_deref(),
        )
        .unwrap_or_default()
    }
}

/// Public view of a user, as exposed by the web API (no phone number)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: String,
    pub created_at: NaiveDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        let full_name = user.display_name();
        Self {
            id: user.id,
            telegram_id: user.telegram_id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            full_name,
            created_at: user.created_at,
        }
    }
}

/// An ad as returned by listings and single-ad fetches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ad {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub photos: Vec<String>,
    pub location: String,
    pub contact_preference: String,
    pub is_active: bool,
    pub views: i64,
    pub created_at: NaiveDateTime,
    pub seller_telegram_id: Option<i64>,
    pub seller_username: Option<String>,
    pub seller_name: Option<String>,
}

/// Raw `ads` row joined with its owner; photos are still JSON text here
#[derive(Debug, Clone, FromRow)]
pub(crate) struct AdRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: Option<String>,
    pub photos: Option<String>,
    pub location: Option<String>,
    pub contact_preference: Option<String>,
    pub is_active: bool,
    pub views: i64,
    pub created_at: NaiveDateTime,
    pub seller_telegram_id: Option<i64>,
    pub seller_username: Option<String>,
    pub seller_first_name: Option<String>,
    pub seller_last_name: Option<String>,
}

impl From<AdRow> for Ad {
    fn from(row: AdRow) -> Self {
        // Rows written by this crate always hold a JSON array; anything else reads as no photos
        let photos = row
            .photos
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
            .unwrap_or_default();

        let seller_name = compose_display_name(
            row.seller_first_name.as_deref(),
            row.seller_last_name.as_deref(),
            row.seller_username.as_deref(),
        );

        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            price: row.price,
            category: row.category.unwrap_or_default(),
            photos,
            location: row.location.unwrap_or_default(),
            contact_preference: row
                .contact_preference
                .unwrap_or_else(|| DEFAULT_CONTACT_PREFERENCE.to_string()),
            is_active: row.is_active,
            views: row.views,
            created_at: row.created_at,
            seller_telegram_id: row.seller_telegram_id,
            seller_username: row.seller_username,
            seller_name,
        }
    }
}

/// Fields of an ad about to be created
#[derive(Debug, Clone, PartialEq)]
pub struct NewAd {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub photos: Vec<String>,
    pub location: String,
    pub contact_preference: String,
}

/// Reasons an ad draft is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdDraftError {
    EmptyTitle,
    NegativePrice,
    NonFinitePrice,
}

impl std::fmt::Display for AdDraftError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdDraftError::EmptyTitle => write!(f, "title must not be empty"),
            AdDraftError::NegativePrice => write!(f, "price must not be negative"),
            AdDraftError::NonFinitePrice => write!(f, "price must be a finite number"),
        }
    }
}

impl NewAd {
    /// Create a draft with only the required fields set
    pub fn new(title: impl Into<String>, price: f64, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            price,
            category: category.into(),
            photos: Vec::new(),
            location: String::new(),
            contact_preference: DEFAULT_CONTACT_PREFERENCE.to_string(),
        }
    }

    /// Check the invariants every stored ad must satisfy
    pub fn validate(&self) -> Result<(), AdDraftError> {
        if self.title.trim().is_empty() {
            return Err(AdDraftError::EmptyTitle);
        }
        if !self.price.is_finite() {
            return Err(AdDraftError::NonFinitePrice);
        }
        if self.price < 0.0 {
            return Err(AdDraftError::NegativePrice);
        }
        Ok(())
    }
}

/// Listing filter for [`crate::db::Store::list_ads`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdFilter {
    pub category: Option<String>,
    /// Internal user id of the owner
    pub user_id: Option<i64>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A static category entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub emoji: String,
}

/// Per-user usage statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_ads: i64,
    pub total_views: i64,
    pub total_favorites: i64,
    pub recent_ads: Vec<Ad>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ad_validation() {
        assert!(NewAd::new("Mod X", 1500.0, "Под системы").validate().is_ok());
        assert!(NewAd::new("Free stuff", 0.0, "Другое").validate().is_ok());

        assert_eq!(
            NewAd::new("   ", 10.0, "Другое").validate(),
            Err(AdDraftError::EmptyTitle)
        );
        assert_eq!(
            NewAd::new("Mod X", -1.0, "Другое").validate(),
            Err(AdDraftError::NegativePrice)
        );
        assert_eq!(
            NewAd::new("Mod X", f64::NAN, "Другое").validate(),
            Err(AdDraftError::NonFinitePrice)
        );
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut user = User {
            id: 1,
            telegram_id: 42,
            username: Some("seller".to_string()),
            first_name: Some("Ivan".to_string()),
            last_name: Some("Petrov".to_string()),
            phone_number: None,
            created_at: NaiveDateTime::default(),
        };
        assert_eq!(user.display_name(), "Ivan Petrov");

        user.last_name = None;
        assert_eq!(user.display_name(), "Ivan");

        user.first_name = None;
        assert_eq!(user.display_name(), "seller");
    }

    #[test]
    fn test_ad_row_with_broken_photos_reads_as_empty() {
        let row = AdRow {
            id: 1,
            user_id: 1,
            title: "Pod".to_string(),
            description: None,
            price: 10.0,
            category: None,
            photos: Some("not json".to_string()),
            location: None,
            contact_preference: None,
            is_active: true,
            views: 0,
            created_at: NaiveDateTime::default(),
            seller_telegram_id: None,
            seller_username: None,
            seller_first_name: Some("Anna".to_string()),
            seller_last_name: None,
        };

        let ad = Ad::from(row);
        assert!(ad.photos.is_empty());
        assert_eq!(ad.contact_preference, DEFAULT_CONTACT_PREFERENCE);
        assert_eq!(ad.seller_name.as_deref(), Some("Anna"));
    }

    #[test]
    fn test_seller_name_matches_profile_name() {
        let user = User {
            id: 3,
            telegram_id: 77,
            username: Some("vape_dealer".to_string()),
            first_name: Some("  ".to_string()),
            last_name: Some("".to_string()),
            phone_number: None,
            created_at: NaiveDateTime::default(),
        };
        let row = AdRow {
            id: 1,
            user_id: user.id,
            title: "Pod".to_string(),
            description: None,
            price: 10.0,
            category: None,
            photos: None,
            location: None,
            contact_preference: None,
            is_active: true,
            views: 0,
            created_at: NaiveDateTime::default(),
            seller_telegram_id: Some(user.telegram_id),
            seller_username: user.username.clone(),
            seller_first_name: user.first_name.clone(),
            seller_last_name: user.last_name.clone(),
        };

        let ad = Ad::from(row);
        assert_eq!(user.display_name(), "vape_dealer");
        assert_eq!(ad.seller_name.as_deref(), Some(user.display_name().as_str()));
        assert_eq!(PublicUser::from(user).full_name, "vape_dealer");

        assert_eq!(compose_display_name(None, Some(" Petrov "), None).as_deref(), Some("Petrov"));
        assert_eq!(compose_display_name(None, None, None), None);
    }
}
