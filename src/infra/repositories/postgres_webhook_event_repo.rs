use crate::domain::{models::webhook::WebhookEventRecord, ports::WebhookEventRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

pub struct PostgresWebhookEventRepo {
    pool: PgPool,
}

impl PostgresWebhookEventRepo {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl WebhookEventRepository for PostgresWebhookEventRepo {
    async fn record(&self, event_id: &str, event_type: &str) -> Result<bool, AppError> {
        let result = sqlx::query("INSERT INTO webhook_events (event_id, event_type, status, received_at) VALUES ($1, $2, 'received', $3) ON CONFLICT (event_id) DO NOTHING").bind(event_id).bind(event_type).bind(Utc::now()).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() == 1)
    }
    async fn mark(&self, event_id: &str, status: &str, error_message: Option<String>) -> Result<(), AppError> {
        sqlx::query("UPDATE webhook_events SET status = $1, error_message = $2 WHERE event_id = $3").bind(status).bind(error_message).bind(event_id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
    async fn find(&self, event_id: &str) -> Result<Option<WebhookEventRecord>, AppError> {
        sqlx::query_as::<_, WebhookEventRecord>("SELECT * FROM webhook_events WHERE event_id = $1").bind(event_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
}
