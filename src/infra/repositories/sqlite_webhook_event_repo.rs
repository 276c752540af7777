use crate::domain::{models::webhook::WebhookEventRecord, ports::WebhookEventRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqliteWebhookEventRepo {
    pool: SqlitePool,
}

impl SqliteWebhookEventRepo {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }
}

#[async_trait]
impl WebhookEventRepository for SqliteWebhookEventRepo {
    async fn record(&self, event_id: &str, event_type: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT INTO webhook_events (event_id, event_type, status, received_at) VALUES (?, ?, 'received', ?)
             ON CONFLICT(event_id) DO NOTHING"
        )
            .bind(event_id).bind(event_type).bind(Utc::now())
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark(&self, event_id: &str, status: &str, error_message: Option<String>) -> Result<(), AppError> {
        sqlx::query("UPDATE webhook_events SET status = ?, error_message = ? WHERE event_id = ?")
            .bind(status).bind(error_message).bind(event_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn find(&self, event_id: &str) -> Result<Option<WebhookEventRecord>, AppError> {
        sqlx::query_as::<_, WebhookEventRecord>("SELECT * FROM webhook_events WHERE event_id = ?")
            .bind(event_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
}
