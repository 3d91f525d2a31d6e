//! # Marketplace Store
//!
//! SQLite-backed data access shared by the bot and the web mini-app.
//! A [`Store`] owns a pool limited to a single connection; clones share it.
//! Expected failures (unknown user or ad, duplicate favorite, invalid draft)
//! come back as `None`/`false`/empty results, only storage errors are raised.

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Executor, QueryBuilder, Sqlite};
use tracing::{debug, info, warn};

use crate::models::{Ad, AdFilter, AdRow, Category, NewAd, User, UserStats};

/// Default page size for ad listings
pub const DEFAULT_PAGE_SIZE: i64 = 50;
/// Upper bound for a single listing page
pub const MAX_PAGE_SIZE: i64 = 100;
/// Number of ads included in [`UserStats::recent_ads`]
pub const RECENT_ADS_LIMIT: i64 = 5;

/// Categories seeded into an empty store
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Расходники", "🔄"),
    ("Жидкость", "💧"),
    ("Одноразовые устройства", "🚬"),
    ("Под системы", "🔋"),
    ("Другое", "📦"),
];

const AD_SELECT: &str = "SELECT a.id, a.user_id, a.title, a.description, a.price, a.category, \
     a.photos, a.location, a.contact_preference, a.is_active, a.views, a.created_at, \
     u.telegram_id AS seller_telegram_id, u.username AS seller_username, \
     u.first_name AS seller_first_name, u.last_name AS seller_last_name \
     FROM ads a LEFT JOIN users u ON u.id = a.user_id";

const USER_COLUMNS: &str =
    "id, telegram_id, username, first_name, last_name, phone_number, created_at";

/// Shared handle to the marketplace database
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if needed) the database at `database_url` and prepare the schema
    pub async fn connect(database_url: &str) -> Result<Self> {
        info!(database_url = %database_url, "Opening marketplace database");

        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {database_url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        Self::with_options(options).await
    }

    /// Open a private in-memory database, used by tests and throwaway runs
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("Failed to build in-memory database options")?
            .foreign_keys(true);

        Self::with_options(options).await
    }

    async fn with_options(options: SqliteConnectOptions) -> Result<Self> {
        // One connection that never expires: statements are serialized and an
        // in-memory database lives as long as the store
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init_database_schema().await?;
        store.seed_categories().await?;
        Ok(store)
    }

    /// Underlying pool, for ad-hoc queries in tests and maintenance code
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the database schema
    async fn init_database_schema(&self) -> Result<()> {
        info!("Initializing database schema...");

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                telegram_id INTEGER NOT NULL UNIQUE,
                username TEXT,
                first_name TEXT,
                last_name TEXT,
                phone_number TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create users table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS ads (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                title TEXT NOT NULL,
                description TEXT,
                price REAL NOT NULL CHECK (price >= 0),
                category TEXT,
                photos TEXT NOT NULL DEFAULT '[]',
                location TEXT,
                contact_preference TEXT NOT NULL DEFAULT 'telegram',
                is_active INTEGER NOT NULL DEFAULT 1,
                views INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create ads table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS favorites (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                ad_id INTEGER NOT NULL REFERENCES ads(id) ON DELETE CASCADE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (user_id, ad_id)
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create favorites table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                emoji TEXT NOT NULL DEFAULT ''
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create categories table")?;

        for (name, ddl) in [
            (
                "idx_ads_active_created",
                "CREATE INDEX IF NOT EXISTS idx_ads_active_created ON ads(is_active, created_at)",
            ),
            (
                "idx_ads_user",
                "CREATE INDEX IF NOT EXISTS idx_ads_user ON ads(user_id)",
            ),
            (
                "idx_favorites_ad",
                "CREATE INDEX IF NOT EXISTS idx_favorites_ad ON favorites(ad_id)",
            ),
        ] {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to create index {name}"))?;
        }

        info!("Database schema initialized successfully");
        Ok(())
    }

    /// Seed the category lookup table if it has never been filled
    async fn seed_categories(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&mut *tx)
            .await
            .context("Failed to count categories")?;

        if existing == 0 {
            for (name, emoji) in DEFAULT_CATEGORIES {
                sqlx::query("INSERT INTO categories (name, emoji) VALUES (?1, ?2)")
                    .bind(*name)
                    .bind(*emoji)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to seed category")?;
            }
            info!(count = DEFAULT_CATEGORIES.len(), "Seeded default categories");
        }

        tx.commit().await?;
        Ok(())
    }

    /// Register a user on first contact, or refresh their name fields
    pub async fn register_user(
        &self,
        telegram_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<User> {
        debug!(telegram_id, "Registering user");

        let sql = format!(
            "INSERT INTO users (telegram_id, username, first_name, last_name)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(telegram_id) DO UPDATE SET
                 username = excluded.username,
                 first_name = excluded.first_name,
                 last_name = excluded.last_name
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(telegram_id)
            .bind(username)
            .bind(first_name)
            .bind(last_name)
            .fetch_one(&self.pool)
            .await
            .context("Failed to upsert user")?;

        Ok(user)
    }

    /// Look a user up by their Telegram id
    pub async fn get_user_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE telegram_id = ?1");

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(telegram_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read user")?;

        if user.is_none() {
            debug!(telegram_id, "No user found");
        }
        Ok(user)
    }

    /// Create an ad owned by `user_id`; `None` if the owner is unknown or the draft is invalid
    pub async fn create_ad(&self, user_id: i64, ad: &NewAd) -> Result<Option<i64>> {
        if let Err(reason) = ad.validate() {
            warn!(user_id, %reason, "Rejected ad draft");
            return Ok(None);
        }

        let photos = serde_json::to_string(&ad.photos).context("Failed to encode photos")?;
        let mut tx = self.pool.begin().await?;

        let owner_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to check ad owner")?;

        if !owner_exists {
            info!(user_id, "Cannot create ad for unknown user");
            return Ok(None);
        }

        let ad_id = sqlx::query(
            "INSERT INTO ads (user_id, title, description, price, category, photos, location, contact_preference)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(user_id)
        .bind(ad.title.trim())
        .bind(&ad.description)
        .bind(ad.price)
        .bind(&ad.category)
        .bind(&photos)
        .bind(&ad.location)
        .bind(&ad.contact_preference)
        .execute(&mut *tx)
        .await
        .context("Failed to insert new ad")?
        .last_insert_rowid();

        tx.commit().await?;

        info!(user_id, ad_id, "Ad created");
        Ok(Some(ad_id))
    }

    /// List active ads matching `filter`, newest first
    pub async fn list_ads(&self, filter: &AdFilter) -> Result<Vec<Ad>> {
        fetch_ads(&self.pool, filter).await
    }

    /// Number of active ads owned by `user_id`
    pub async fn count_active_ads(&self, user_id: i64) -> Result<i64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM ads WHERE user_id = ?1 AND is_active = 1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count ads")?;

        Ok(total)
    }

    /// Fetch one ad by id and count the view
    pub async fn get_ad(&self, ad_id: i64) -> Result<Option<Ad>> {
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE ads SET views = views + 1 WHERE id = ?1")
            .bind(ad_id)
            .execute(&mut *tx)
            .await
            .context("Failed to increment ad views")?
            .rows_affected();

        if touched == 0 {
            debug!(ad_id, "No ad found");
            return Ok(None);
        }

        let sql = format!("{AD_SELECT} WHERE a.id = ?1");
        let row = sqlx::query_as::<_, AdRow>(&sql)
            .bind(ad_id)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to read ad")?;

        tx.commit().await?;
        Ok(row.map(Ad::from))
    }

    /// Flip the favorite flag for (`user_id`, `ad_id`) and return the new state
    ///
    /// `None` when the user does not exist, or when adding a favorite for an
    /// ad that does not exist or is no longer active.
    pub async fn toggle_favorite(&self, user_id: i64, ad_id: i64) -> Result<Option<bool>> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM favorites WHERE user_id = ?1 AND ad_id = ?2")
            .bind(user_id)
            .bind(ad_id)
            .execute(&mut *tx)
            .await
            .context("Failed to remove favorite")?
            .rows_affected();

        if removed > 0 {
            tx.commit().await?;
            info!(user_id, ad_id, "Favorite removed");
            return Ok(Some(false));
        }

        let (user_exists, ad_active): (bool, bool) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1),
                    EXISTS(SELECT 1 FROM ads WHERE id = ?2 AND is_active = 1)",
        )
        .bind(user_id)
        .bind(ad_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to check favorite target")?;

        if !user_exists || !ad_active {
            debug!(user_id, ad_id, user_exists, ad_active, "Favorite target not found");
            return Ok(None);
        }

        sqlx::query("INSERT OR IGNORE INTO favorites (user_id, ad_id) VALUES (?1, ?2)")
            .bind(user_id)
            .bind(ad_id)
            .execute(&mut *tx)
            .await
            .context("Failed to add favorite")?;

        tx.commit().await?;
        info!(user_id, ad_id, "Favorite added");
        Ok(Some(true))
    }

    /// Whether `user_id` has bookmarked `ad_id`
    pub async fn is_favorite(&self, user_id: i64, ad_id: i64) -> Result<bool> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM favorites WHERE user_id = ?1 AND ad_id = ?2)",
        )
        .bind(user_id)
        .bind(ad_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check favorite")?;

        Ok(found)
    }

    /// Active ads bookmarked by `user_id`, most recently bookmarked first
    pub async fn get_user_favorites(&self, user_id: i64) -> Result<Vec<Ad>> {
        let sql = format!(
            "{AD_SELECT} JOIN favorites f ON f.ad_id = a.id
             WHERE f.user_id = ?1 AND a.is_active = 1
             ORDER BY f.created_at DESC, f.id DESC"
        );

        let rows = sqlx::query_as::<_, AdRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list favorites")?;

        Ok(rows.into_iter().map(Ad::from).collect())
    }

    /// Deactivate an ad; only succeeds for the owner of an active ad
    pub async fn delete_ad(&self, user_id: i64, ad_id: i64) -> Result<bool> {
        info!(user_id, ad_id, "Deactivating ad");

        let rows_affected = sqlx::query(
            "UPDATE ads SET is_active = 0 WHERE id = ?1 AND user_id = ?2 AND is_active = 1",
        )
        .bind(ad_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("Failed to deactivate ad")?
        .rows_affected();

        if rows_affected > 0 {
            info!(ad_id, "Ad deactivated");
            Ok(true)
        } else {
            info!(user_id, ad_id, "No active ad owned by user");
            Ok(false)
        }
    }

    /// Usage statistics over the user's active ads
    pub async fn get_user_stats(&self, user_id: i64) -> Result<UserStats> {
        let mut tx = self.pool.begin().await?;

        let (total_ads, total_views): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(views), 0) FROM ads WHERE user_id = ?1 AND is_active = 1",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to aggregate ad stats")?;

        let total_favorites: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM favorites f JOIN ads a ON a.id = f.ad_id
             WHERE a.user_id = ?1 AND a.is_active = 1",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count favorites")?;

        let recent_ads = fetch_ads(
            &mut *tx,
            &AdFilter {
                user_id: Some(user_id),
                limit: Some(RECENT_ADS_LIMIT),
                ..AdFilter::default()
            },
        )
        .await?;

        tx.commit().await?;

        Ok(UserStats {
            total_ads,
            total_views,
            total_favorites,
            recent_ads,
        })
    }

    /// All categories in seeding order
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, emoji FROM categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list categories")?;

        Ok(categories)
    }
}

/// Run the active-ads listing query on any executor (pool or open transaction)
async fn fetch_ads<'e, E>(executor: E, filter: &AdFilter) -> Result<Vec<Ad>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let limit = filter
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = filter.offset.unwrap_or(0).max(0);

    let mut query = QueryBuilder::<Sqlite>::new(AD_SELECT);
    query.push(" WHERE a.is_active = 1");

    if let Some(category) = filter.category.as_deref().filter(|c| !c.trim().is_empty()) {
        query.push(" AND a.category = ").push_bind(category.to_string());
    }

    if let Some(user_id) = filter.user_id {
        query.push(" AND a.user_id = ").push_bind(user_id);
    }

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        query
            .push(" AND (a.title LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR a.description LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }

    query
        .push(" ORDER BY a.created_at DESC, a.id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows = query
        .build_query_as::<AdRow>()
        .fetch_all(executor)
        .await
        .context("Failed to list ads")?;

    debug!(count = rows.len(), "Listed ads");
    Ok(rows.into_iter().map(Ad::from).collect())
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
