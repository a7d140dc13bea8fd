use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, QueryBuilder, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::EngagementRecord;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEngagementLog {
    pub user: String,
    pub user_type: String,
    pub actions: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEngagementLog {
    pub id: i64,
    pub user: String,
    pub user_type: String,
    pub actions: i64,
    pub date: NaiveDate,
}

impl From<StoredEngagementLog> for EngagementRecord {
    fn from(log: StoredEngagementLog) -> Self {
        Self {
            user: log.user,
            user_type: log.user_type,
            actions: log.actions,
            date: log.date.format(DATE_FORMAT).to_string(),
        }
    }
}

/// Optional constraints on a log query. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub user_type: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to an in-memory database sees its own empty database.
        let pool = if is_memory_url(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(connect_options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(connect_options)
                .await?
        };

        let storage = Self { pool };
        storage.ensure_schema().await?;
        Ok(storage)
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS engagement_logs (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                "user"    TEXT NOT NULL,
                user_type TEXT NOT NULL,
                actions   INTEGER NOT NULL,
                date      TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure engagement_logs table exists")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_engagement_logs_type_date ON engagement_logs (user_type, date)",
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure engagement_logs index exists")?;
        Ok(())
    }

    /// Inserts all logs in one transaction and returns how many were written.
    pub async fn insert_logs(&self, logs: &[NewEngagementLog]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        for log in logs {
            sqlx::query(
                r#"INSERT INTO engagement_logs ("user", user_type, actions, date) VALUES (?, ?, ?, ?)"#,
            )
            .bind(&log.user)
            .bind(&log.user_type)
            .bind(log.actions)
            .bind(log.date)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to insert engagement log for '{}'", log.user))?;
        }
        tx.commit().await?;
        Ok(logs.len() as u64)
    }

    pub async fn query_logs(&self, filter: &LogFilter) -> Result<Vec<StoredEngagementLog>> {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"SELECT id, "user", user_type, actions, date FROM engagement_logs WHERE 1 = 1"#,
        );
        if let Some(user_type) = &filter.user_type {
            query.push(" AND user_type = ").push_bind(user_type.clone());
        }
        if let Some(from_date) = filter.from_date {
            query.push(" AND date >= ").push_bind(from_date);
        }
        if let Some(to_date) = filter.to_date {
            query.push(" AND date <= ").push_bind(to_date);
        }
        query.push(" ORDER BY id ASC");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .context("failed to query engagement logs")?;

        rows.into_iter()
            .map(|row| -> Result<StoredEngagementLog> {
                Ok(StoredEngagementLog {
                    id: row.try_get("id")?,
                    user: row.try_get("user")?,
                    user_type: row.try_get("user_type")?,
                    actions: row.try_get("actions")?,
                    date: row.try_get("date")?,
                })
            })
            .collect()
    }

    pub async fn count_logs(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM engagement_logs")
            .fetch_one(&self.pool)
            .await
            .context("failed to count engagement logs")?;
        Ok(count)
    }
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_memory_url(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
