//! 数据存储模块

use crate::types::{ETLError, ETLResult, NormalizedJobRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::path::PathBuf;
use std::str::FromStr;

/// 职位存储（SQLite），按 ID 保留首次写入的记录
pub struct JobStore {
    pool: SqlitePool,
}

impl JobStore {
    /// 创建新的存储实例
    pub async fn new(database_url: &str) -> ETLResult<Self> {
        // 确保数据库文件的目录存在
        if let Some(parent) = database_path(database_url).and_then(|p| p.parent().map(PathBuf::from)) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| ETLError::Database(e.to_string()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| ETLError::Database(e.to_string()))?;

        let store = Self { pool };
        store.initialize_schema().await?;

        Ok(store)
    }

    /// 初始化数据库schema
    async fn initialize_schema(&self) -> ETLResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS job_postings (
                id TEXT PRIMARY KEY,
                title TEXT,
                company TEXT,
                location TEXT,
                created TEXT,
                payload TEXT NOT NULL,
                stored_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ETLError::Database(e.to_string()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_job_created ON job_postings(created)")
            .execute(&self.pool)
            .await
            .map_err(|e| ETLError::Database(e.to_string()))?;

        Ok(())
    }

    /// 保存记录，已存在的 ID 不覆盖；返回新写入的条数
    pub async fn save_records(&self, jobs: &[NormalizedJobRecord]) -> ETLResult<usize> {
        let stored_at = timestamp_key(Utc::now());
        let mut inserted = 0;

        for job in jobs {
            let payload = serde_json::to_string(job)?;
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO job_postings
                (id, title, company, location, created, payload, stored_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&job.id)
            .bind(&job.title)
            .bind(&job.company)
            .bind(&job.location)
            .bind(job.created.map(timestamp_key))
            .bind(&payload)
            .bind(&stored_at)
            .execute(&self.pool)
            .await
            .map_err(|e| ETLError::Database(e.to_string()))?;

            inserted += result.rows_affected() as usize;
        }

        tracing::debug!("Stored {} of {} job records", inserted, jobs.len());
        Ok(inserted)
    }

    /// 根据发布时间范围查询，`None` 表示该端不限；没有发布时间的记录不返回
    pub async fn query_by_timerange(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> ETLResult<Vec<NormalizedJobRecord>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT payload FROM job_postings WHERE created IS NOT NULL");
        if let Some(start) = start {
            query.push(" AND created >= ").push_bind(timestamp_key(start));
        }
        if let Some(end) = end {
            query.push(" AND created <= ").push_bind(timestamp_key(end));
        }
        query.push(" ORDER BY created ASC");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ETLError::Database(e.to_string()))?;

        Ok(decode_rows(&rows))
    }

    /// 全部记录，按写入顺序
    pub async fn load_all(&self) -> ETLResult<Vec<NormalizedJobRecord>> {
        let rows = sqlx::query("SELECT payload FROM job_postings ORDER BY rowid ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ETLError::Database(e.to_string()))?;

        Ok(decode_rows(&rows))
    }

    /// 统计信息
    pub async fn stats(&self) -> ETLResult<StoreStats> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_postings")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ETLError::Database(e.to_string()))?;

        let dated: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM job_postings WHERE created IS NOT NULL")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| ETLError::Database(e.to_string()))?;

        Ok(StoreStats {
            total_jobs: total as usize,
            dated_jobs: dated as usize,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub total_jobs: usize,
    pub dated_jobs: usize,
}

fn decode_rows(rows: &[sqlx::sqlite::SqliteRow]) -> Vec<NormalizedJobRecord> {
    rows.iter()
        .filter_map(|row| {
            let payload: String = row.get("payload");
            match serde_json::from_str(&payload) {
                Ok(job) => Some(job),
                Err(e) => {
                    tracing::warn!("Skipping unreadable stored job: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// 固定格式，保证字符串比较与时间顺序一致
fn timestamp_key(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn database_path(database_url: &str) -> Option<PathBuf> {
    if database_url.contains(":memory:") {
        return None;
    }
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    let path = path.split('?').next().unwrap_or(path);
    Some(PathBuf::from(path))
}
