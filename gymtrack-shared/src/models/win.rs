/// Auction win model
///
/// Wins are recorded by an administrator against a member. Members only read
/// their own wins; the admin panel lists, edits and deletes all of them.
///
/// # Example
///
/// ```no_run
/// use gymtrack_shared::models::win::{Win, CreateWin};
/// use chrono::NaiveDate;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, member: Uuid) -> Result<(), sqlx::Error> {
/// let win = Win::create(&pool, CreateWin {
///     user_id: member,
///     title: "Vintage rowing machine".to_string(),
///     description: "Restored wooden frame".to_string(),
///     image: None,
///     auction_date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
///     final_bid: 180.0,
/// }).await?;
///
/// let mine = Win::list_for_user(&pool, member).await?;
/// assert!(mine.iter().any(|w| w.id == win.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const WIN_COLUMNS: &str = "id, user_id, title, description, image, auction_date, final_bid, \
                           created_at, updated_at";

/// An auction item won by a member
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Win {
    pub id: Uuid,

    /// Member who won the auction
    pub user_id: Uuid,

    pub title: String,

    pub description: String,

    /// Optional image reference
    pub image: Option<String>,

    /// Day the auction closed
    pub auction_date: NaiveDate,

    /// Winning bid in currency units
    pub final_bid: f64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Win joined with its owner, for the admin listing
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WinWithOwner {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub auction_date: NaiveDate,
    pub final_bid: f64,
}

/// Input for recording a win
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWin {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub auction_date: NaiveDate,
    pub final_bid: f64,
}

/// Partial update, only `Some` fields are written
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateWin {
    pub user_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub auction_date: Option<NaiveDate>,
    pub final_bid: Option<f64>,
}

impl UpdateWin {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.image.is_none()
            && self.auction_date.is_none()
            && self.final_bid.is_none()
    }
}

impl Win {
    /// Records a new win
    ///
    /// # Errors
    ///
    /// A foreign-key violation is returned if `user_id` does not exist.
    pub async fn create(pool: &PgPool, data: CreateWin) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO wins (user_id, title, description, image, auction_date, final_bid) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {WIN_COLUMNS}"
        );

        sqlx::query_as::<_, Win>(&query)
            .bind(data.user_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.image)
            .bind(data.auction_date)
            .bind(data.final_bid)
            .fetch_one(pool)
            .await
    }

    /// Finds a win by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {WIN_COLUMNS} FROM wins WHERE id = $1");

        sqlx::query_as::<_, Win>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A member's wins, most recent auction first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {WIN_COLUMNS} FROM wins \
             WHERE user_id = $1 \
             ORDER BY auction_date DESC, created_at DESC"
        );

        sqlx::query_as::<_, Win>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Every win with its owner's name and email
    pub async fn list_all(pool: &PgPool) -> Result<Vec<WinWithOwner>, sqlx::Error> {
        sqlx::query_as::<_, WinWithOwner>(
            r#"
            SELECT w.id, w.user_id, u.name AS user_name, u.email AS user_email,
                   w.title, w.description, w.image, w.auction_date, w.final_bid
            FROM wins w
            JOIN users u ON u.id = w.user_id
            ORDER BY w.auction_date DESC, w.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Applies a partial update
    ///
    /// Returns `None` if the win does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateWin,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE wins SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.user_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", user_id = ${}", bind_count));
        }
        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.image.is_some() {
            bind_count += 1;
            query.push_str(&format!(", image = ${}", bind_count));
        }
        if data.auction_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", auction_date = ${}", bind_count));
        }
        if data.final_bid.is_some() {
            bind_count += 1;
            query.push_str(&format!(", final_bid = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {WIN_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Win>(&query).bind(id);

        if let Some(user_id) = data.user_id {
            q = q.bind(user_id);
        }
        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(image) = data.image {
            q = q.bind(image);
        }
        if let Some(auction_date) = data.auction_date {
            q = q.bind(auction_date);
        }
        if let Some(final_bid) = data.final_bid {
            q = q.bind(final_bid);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a win, returning whether a row was removed
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM wins WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
