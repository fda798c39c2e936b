/// User model and database operations
///
/// A user is a registered gym member. Besides credentials and profile fields
/// each user carries a monetary `balance` that grows while they have an open
/// equipment session. Nothing in the system ever subtracts from it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL,            -- unique on LOWER(email)
///     password_hash VARCHAR(255) NOT NULL,
///     name VARCHAR(255) NOT NULL,
///     sex VARCHAR(32),
///     dob DATE,
///     is_admin BOOLEAN NOT NULL DEFAULT FALSE,
///     balance DOUBLE PRECISION NOT NULL DEFAULT 0 CHECK (balance >= 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use gymtrack_shared::models::user::{User, CreateUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     email: "member@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: "Sam Member".to_string(),
///     sex: None,
///     dob: None,
///     is_admin: false,
/// }).await?;
///
/// let balance = User::credit_balance(&pool, user.id, 0.25).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, password_hash, name, sex, dob, is_admin, balance, \
                            created_at, updated_at, last_login_at";

/// A registered member
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address, stored lowercased
    pub email: String,

    /// Argon2id password hash (never serialized)
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Display name
    pub name: String,

    /// Optional sex, free text as entered at signup
    pub sex: Option<String>,

    /// Optional date of birth
    pub dob: Option<NaiveDate>,

    /// Administrators manage auction wins
    pub is_admin: bool,

    /// Accrued balance in currency units
    pub balance: f64,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the user last logged in
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address (lowercased before insert)
    pub email: String,

    /// Argon2id password hash, not the plaintext password
    pub password_hash: String,

    /// Display name
    pub name: String,

    /// Optional sex
    pub sex: Option<String>,

    /// Optional date of birth
    pub dob: Option<NaiveDate>,

    /// Grant administrator rights
    pub is_admin: bool,
}

/// Lightweight listing row used by the admin panel
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub balance: f64,
}

/// Lowercases and trims an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns a database error if the email is already registered
    /// (unique index `users_email_key`).
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, password_hash, name, sex, dob, is_admin) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(&data.email))
            .bind(data.password_hash)
            .bind(data.name)
            .bind(data.sex)
            .bind(data.dob)
            .bind(data.is_admin)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await
    }

    /// Lists every non-admin member, ordered by name
    pub async fn list_members(pool: &PgPool) -> Result<Vec<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT id, email, name, balance
            FROM users
            WHERE is_admin = FALSE
            ORDER BY name ASC, email ASC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Records a successful login
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Reads the current balance
    pub async fn balance(pool: &PgPool, id: Uuid) -> Result<Option<f64>, sqlx::Error> {
        sqlx::query_scalar("SELECT balance FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Atomically adds `amount` to the user's balance
    ///
    /// The increment happens inside a single `UPDATE`, so concurrent callers
    /// for the same user never lose each other's credits. Returns the new
    /// balance, or `None` if the user no longer exists.
    pub async fn credit_balance(
        pool: &PgPool,
        id: Uuid,
        amount: f64,
    ) -> Result<Option<f64>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            UPDATE users
            SET balance = balance + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING balance
            "#,
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a user and, by cascade, their usage records and wins
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Member@Example.COM "), "member@example.com");
        assert_eq!(normalize_email("plain@x.io"), "plain@x.io");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "member@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            name: "Sam".to_string(),
            sex: Some("F".to_string()),
            dob: NaiveDate::from_ymd_opt(1990, 4, 2),
            is_admin: false,
            balance: 1.5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["balance"], 1.5);
        assert_eq!(json["dob"], "1990-04-02");
    }
}
