//! SQLite storage layer for Fitplan.
//!
//! Two tables:
//!
//! - `users`: one row per registered profile, unique by email
//! - `model_requests`: append-only log of generation requests and results
//!
//! Every operation is a single statement on a pooled connection.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};

use crate::model::{Profile, RequestLogRecord, UserRecord};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Create a new storage instance and initialize the schema.
    ///
    /// # Arguments
    ///
    /// * `database_url` - SQLite connection string (e.g., "sqlite:fitplan.db" or "sqlite::memory:")
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let storage = Self { pool };
        storage.initialize_schema().await?;

        Ok(storage)
    }

    /// Create the database schema if it doesn't exist.
    async fn initialize_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                age INTEGER NOT NULL,
                height_cm REAL NOT NULL,
                weight_kg REAL NOT NULL,
                gender TEXT NOT NULL,
                activity_level TEXT NOT NULL,
                goal TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS model_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER,
                request_json TEXT NOT NULL,
                response_json TEXT NOT NULL,
                model_name TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_model_requests_user
            ON model_requests(user_id, created_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a user and return the stored row.
    ///
    /// Fails if the email is already registered; callers that want a
    /// friendly message check [`Storage::find_user_by_email`] first.
    pub async fn create_user(&self, email: &str, profile: &Profile) -> anyhow::Result<UserRecord> {
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (email, age, height_cm, weight_kg, gender, activity_level, goal, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(email)
        .bind(i64::from(profile.age))
        .bind(profile.height_cm)
        .bind(profile.weight_kg)
        .bind(profile.gender.as_str())
        .bind(profile.activity_level.as_str())
        .bind(profile.goal.as_str())
        .bind(created_at.timestamp())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_user(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user {id} missing after insert"))
    }

    /// Look up a user by id.
    pub async fn get_user(&self, id: i64) -> anyhow::Result<Option<UserRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, age, height_cm, weight_kg, gender, activity_level, goal, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Look up a user by email.
    pub async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, age, height_cm, weight_kg, gender, activity_level, goal, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// All users in insertion order.
    pub async fn list_users(&self) -> anyhow::Result<Vec<UserRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, email, age, height_cm, weight_kg, gender, activity_level, goal, created_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    /// Append one generation request to the log.
    pub async fn insert_model_request(
        &self,
        user_id: Option<i64>,
        request_json: &str,
        response_json: &str,
        model_name: &str,
    ) -> anyhow::Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO model_requests (user_id, request_json, response_json, model_name, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(request_json)
        .bind(response_json)
        .bind(model_name)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Logged requests, newest first.
    pub async fn list_model_requests(&self, limit: u32) -> anyhow::Result<Vec<RequestLogRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, request_json, response_json, model_name, created_at
            FROM model_requests
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| -> anyhow::Result<RequestLogRecord> {
                Ok(RequestLogRecord {
                    id: r.get("id"),
                    user_id: r.get("user_id"),
                    request_json: r.get("request_json"),
                    response_json: r.get("response_json"),
                    model_name: r.get("model_name"),
                    created_at: from_unix(r.get("created_at"))?,
                })
            })
            .collect()
    }

    /// Close the pool. Later operations fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn user_from_row(row: &SqliteRow) -> anyhow::Result<UserRecord> {
    let gender: String = row.get("gender");
    let activity_level: String = row.get("activity_level");
    let goal: String = row.get("goal");
    let age: i64 = row.get("age");

    Ok(UserRecord {
        id: row.get("id"),
        email: row.get("email"),
        age: u32::try_from(age)?,
        height_cm: row.get("height_cm"),
        weight_kg: row.get("weight_kg"),
        gender: gender
            .parse()
            .map_err(|_| anyhow::anyhow!("stored gender '{gender}' is not recognised"))?,
        activity_level: activity_level.parse().map_err(|_| {
            anyhow::anyhow!("stored activity level '{activity_level}' is not recognised")
        })?,
        goal: goal
            .parse()
            .map_err(|_| anyhow::anyhow!("stored goal '{goal}' is not recognised"))?,
        created_at: from_unix(row.get("created_at"))?,
    })
}

fn from_unix(ts: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| anyhow::anyhow!("stored timestamp {ts} is out of range"))
}
