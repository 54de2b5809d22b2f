use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::{NotificationRequest, NotificationStatus};
use crate::shared::AppError;

/// Storage for notification correlation records
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create_request(&self, request: &NotificationRequest) -> Result<(), AppError>;
    async fn get_request(&self, request_id: &str)
        -> Result<Option<NotificationRequest>, AppError>;

    /// Records the answer. A request can only be completed once, and never
    /// after it expired.
    async fn complete_request(
        &self,
        request_id: &str,
        response: bool,
    ) -> Result<NotificationRequest, AppError>;

    /// Expires a pending request once its sender stops waiting. Returns the
    /// stored record, which is still `completed` if the answer won the race.
    async fn expire_request(&self, request_id: &str) -> Result<NotificationRequest, AppError>;
}

fn not_pending(status: NotificationStatus) -> AppError {
    match status {
        NotificationStatus::Expired => {
            AppError::Precondition("Notification has expired".to_string())
        }
        _ => AppError::Precondition("Notification was already answered".to_string()),
    }
}

fn request_not_found() -> AppError {
    AppError::NotFound("Notification request not found".to_string())
}

/// In-memory implementation of NotificationRepository for development and testing
pub struct InMemoryNotificationRepository {
    requests: RwLock<HashMap<String, NotificationRequest>>,
}

impl Default for InMemoryNotificationRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self {
            requests: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    #[instrument(skip(self, request), fields(request_id = %request.request_id))]
    async fn create_request(&self, request: &NotificationRequest) -> Result<(), AppError> {
        let mut requests = self.requests.write().await;
        if requests.contains_key(&request.request_id) {
            return Err(AppError::DatabaseError(
                "Notification request already exists".to_string(),
            ));
        }
        requests.insert(request.request_id.clone(), request.clone());

        debug!("Notification request stored in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_request(
        &self,
        request_id: &str,
    ) -> Result<Option<NotificationRequest>, AppError> {
        Ok(self.requests.read().await.get(request_id).cloned())
    }

    #[instrument(skip(self))]
    async fn complete_request(
        &self,
        request_id: &str,
        response: bool,
    ) -> Result<NotificationRequest, AppError> {
        let mut requests = self.requests.write().await;
        let request = requests.get_mut(request_id).ok_or_else(request_not_found)?;

        if request.status != NotificationStatus::Pending {
            warn!(status = %request.status, "Answer for a request that is no longer pending");
            return Err(not_pending(request.status));
        }

        request.complete(response);
        debug!(response, "Notification request completed in memory");
        Ok(request.clone())
    }

    #[instrument(skip(self))]
    async fn expire_request(&self, request_id: &str) -> Result<NotificationRequest, AppError> {
        let mut requests = self.requests.write().await;
        let request = requests.get_mut(request_id).ok_or_else(request_not_found)?;

        if request.status == NotificationStatus::Pending {
            request.expire();
            debug!("Notification request expired in memory");
        }
        Ok(request.clone())
    }
}

const REQUEST_COLUMNS: &str = "request_id, target_player_id, title, body, requires_feedback, \
                               status, response, created_at, responded_at";

/// PostgreSQL implementation of NotificationRepository
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(e: sqlx::Error) -> AppError {
    warn!(error = %e, "Notification query failed");
    AppError::DatabaseError(e.to_string())
}

fn request_from_row(row: &PgRow) -> Result<NotificationRequest, AppError> {
    let status: String = row.try_get("status").map_err(db_error)?;
    let status = status
        .parse::<NotificationStatus>()
        .map_err(|_| AppError::DatabaseError(format!("Invalid notification status: {}", status)))?;

    Ok(NotificationRequest {
        request_id: row.try_get("request_id").map_err(db_error)?,
        target_player_id: row.try_get("target_player_id").map_err(db_error)?,
        title: row.try_get("title").map_err(db_error)?,
        body: row.try_get("body").map_err(db_error)?,
        requires_feedback: row.try_get("requires_feedback").map_err(db_error)?,
        status,
        response: row.try_get("response").map_err(db_error)?,
        created_at: row.try_get("created_at").map_err(db_error)?,
        responded_at: row.try_get("responded_at").map_err(db_error)?,
    })
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    #[instrument(skip(self, request), fields(request_id = %request.request_id))]
    async fn create_request(&self, request: &NotificationRequest) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO notification_requests (request_id, target_player_id, title, body, \
             requires_feedback, status, response, created_at, responded_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&request.request_id)
        .bind(&request.target_player_id)
        .bind(&request.title)
        .bind(&request.body)
        .bind(request.requires_feedback)
        .bind(request.status.to_string())
        .bind(request.response)
        .bind(request.created_at)
        .bind(request.responded_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_request(
        &self,
        request_id: &str,
    ) -> Result<Option<NotificationRequest>, AppError> {
        let query = format!(
            "SELECT {} FROM notification_requests WHERE request_id = $1",
            REQUEST_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.as_ref().map(request_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn complete_request(
        &self,
        request_id: &str,
        response: bool,
    ) -> Result<NotificationRequest, AppError> {
        let query = format!(
            "UPDATE notification_requests SET status = 'completed', response = $2, responded_at = $3 \
             WHERE request_id = $1 AND status = 'pending' RETURNING {}",
            REQUEST_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(request_id)
            .bind(response)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        match row {
            Some(row) => request_from_row(&row),
            None => match self.get_request(request_id).await? {
                Some(existing) => Err(not_pending(existing.status)),
                None => Err(request_not_found()),
            },
        }
    }

    #[instrument(skip(self))]
    async fn expire_request(&self, request_id: &str) -> Result<NotificationRequest, AppError> {
        let query = format!(
            "UPDATE notification_requests SET status = 'expired' \
             WHERE request_id = $1 AND status = 'pending' RETURNING {}",
            REQUEST_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        match row {
            Some(row) => request_from_row(&row),
            None => self
                .get_request(request_id)
                .await?
                .ok_or_else(request_not_found),
        }
    }
}
