use crate::{
    config::AppConfig,
    error::{AppError, Result},
    models::*,
};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

/// Points granted the first time a lesson is completed.
pub const LESSON_COMPLETION_POINTS: i32 = 100;

const SCHEMA: [&str; 6] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email VARCHAR(255) UNIQUE NOT NULL,
        password_hash VARCHAR(255) NOT NULL,
        full_name VARCHAR(255) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS financial_profiles (
        id UUID PRIMARY KEY,
        user_id UUID UNIQUE NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        monthly_income DOUBLE PRECISION NOT NULL DEFAULT 0,
        monthly_expenses DOUBLE PRECISION NOT NULL DEFAULT 0,
        savings_goal DOUBLE PRECISION NOT NULL DEFAULT 0,
        risk_tolerance TEXT NOT NULL DEFAULT 'moderate',
        skills TEXT[] NOT NULL DEFAULT '{}',
        location TEXT NOT NULL DEFAULT '',
        time_availability TEXT NOT NULL DEFAULT '',
        financial_level TEXT NOT NULL DEFAULT 'beginner',
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_progress (
        id UUID PRIMARY KEY,
        user_id UUID UNIQUE NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        completed_lessons TEXT[] NOT NULL DEFAULT '{}',
        total_points INTEGER NOT NULL DEFAULT 0,
        achievements TEXT[] NOT NULL DEFAULT '{}',
        current_streak INTEGER NOT NULL DEFAULT 0,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS advisor_records (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        kind VARCHAR(64) NOT NULL,
        payload JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS chat_messages (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        role VARCHAR(16) NOT NULL,
        content TEXT NOT NULL,
        timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS advisor_records_lookup ON advisor_records (user_id, kind, created_at DESC)",
];

pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let pool = PgPool::connect(&config.database.url)
            .await
            .map_err(AppError::Database)?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(AppError::Database)?;
        }

        Ok(Self { pool })
    }

    // Users

    /// Creates the user together with an empty profile and progress record.
    pub async fn create_user(&self, email: &str, full_name: &str, password_hash: &str) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, full_name)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(full_name)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO financial_profiles (id, user_id) VALUES ($1, $2)")
            .bind(Uuid::new_v4())
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO user_progress (id, user_id) VALUES ($1, $2)")
            .bind(Uuid::new_v4())
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    // Profile

    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<FinancialProfile>> {
        let profile = sqlx::query_as::<_, FinancialProfile>(
            "SELECT * FROM financial_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Applies only the fields present in `update`.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: &FinancialProfileUpdate,
    ) -> Result<Option<FinancialProfile>> {
        let profile = sqlx::query_as::<_, FinancialProfile>(
            r#"
            UPDATE financial_profiles SET
                monthly_income = COALESCE($2, monthly_income),
                monthly_expenses = COALESCE($3, monthly_expenses),
                savings_goal = COALESCE($4, savings_goal),
                risk_tolerance = COALESCE($5, risk_tolerance),
                skills = COALESCE($6, skills),
                location = COALESCE($7, location),
                time_availability = COALESCE($8, time_availability),
                financial_level = COALESCE($9, financial_level),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(update.monthly_income)
        .bind(update.monthly_expenses)
        .bind(update.savings_goal)
        .bind(update.risk_tolerance.as_deref())
        .bind(update.skills.as_deref())
        .bind(update.location.as_deref())
        .bind(update.time_availability.as_deref())
        .bind(update.financial_level.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    // Advisor results

    pub async fn insert_record<T: Serialize>(&self, kind: RecordKind, record: &AdvisorRecord<T>) -> Result<()> {
        let payload = serde_json::to_value(&record.data)
            .map_err(|e| AppError::Internal(format!("Serialization error: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO advisor_records (id, user_id, kind, payload, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(kind.as_str())
        .bind(payload)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Newest first.
    pub async fn list_records<T: DeserializeOwned>(
        &self,
        user_id: Uuid,
        kind: RecordKind,
        limit: i64,
    ) -> Result<Vec<AdvisorRecord<T>>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, payload, created_at FROM advisor_records
            WHERE user_id = $1 AND kind = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    pub async fn latest_record<T: DeserializeOwned>(
        &self,
        user_id: Uuid,
        kind: RecordKind,
    ) -> Result<Option<AdvisorRecord<T>>> {
        Ok(self.list_records(user_id, kind, 1).await?.into_iter().next())
    }

    // Education progress

    pub async fn get_progress(&self, user_id: Uuid) -> Result<Option<UserProgress>> {
        let progress = sqlx::query_as::<_, UserProgress>("SELECT * FROM user_progress WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(progress)
    }

    /// Idempotent per lesson id: repeated completions award nothing.
    pub async fn complete_lesson(&self, user_id: Uuid, lesson_id: &str) -> Result<Option<UserProgress>> {
        sqlx::query(
            r#"
            UPDATE user_progress SET
                completed_lessons = array_append(completed_lessons, $2),
                total_points = total_points + $3,
                current_streak = current_streak + 1,
                updated_at = NOW()
            WHERE user_id = $1 AND NOT ($2 = ANY(completed_lessons))
            "#,
        )
        .bind(user_id)
        .bind(lesson_id)
        .bind(LESSON_COMPLETION_POINTS)
        .execute(&self.pool)
        .await?;

        self.get_progress(user_id).await
    }

    // Chat

    pub async fn insert_chat_messages(&self, messages: &[ChatMessage]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for message in messages {
            sqlx::query(
                "INSERT INTO chat_messages (id, user_id, role, content, timestamp) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(message.id)
            .bind(message.user_id)
            .bind(&message.role)
            .bind(&message.content)
            .bind(message.timestamp)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// The latest `limit` messages, returned oldest first.
    pub async fn recent_chat_messages(&self, user_id: Uuid, limit: i64) -> Result<Vec<ChatMessage>> {
        let mut messages = sqlx::query_as::<_, ChatMessage>(
            "SELECT * FROM chat_messages WHERE user_id = $1 ORDER BY timestamp DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        messages.reverse();
        Ok(messages)
    }

    pub async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;

        Ok(true)
    }
}

fn record_from_row<T: DeserializeOwned>(row: &PgRow) -> Result<AdvisorRecord<T>> {
    let payload: serde_json::Value = row.try_get("payload")?;
    let data = serde_json::from_value(payload)
        .map_err(|e| AppError::Internal(format!("Deserialization error: {}", e)))?;

    Ok(AdvisorRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        data,
        created_at: row.try_get("created_at")?,
    })
}
