/// Notice queue for delete, help and report requests
///
/// Notices are written through the public API and read out of band by the
/// operations side; nothing in the request path consumes them.
use crate::{
    db::models::Notice,
    error::{ApiError, ApiResult},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// What a notice asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// Account deletion request
    Delete,
    /// Support request
    Help,
    /// Report about another user or post
    Report,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::Delete => "delete",
            NoticeKind::Help => "help",
            NoticeKind::Report => "report",
        }
    }
}

/// Notice submission body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeRequest {
    pub name: Option<String>,
    pub message: String,
}

/// Manages the notice queue
pub struct NoticeManager {
    db: SqlitePool,
}

impl NoticeManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Enqueue a notice
    pub async fn submit(
        &self,
        kind: NoticeKind,
        user_id: Option<&str>,
        request: NoticeRequest,
    ) -> ApiResult<Notice> {
        if request.message.trim().is_empty() {
            return Err(ApiError::Validation("Message is required".to_string()));
        }

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO notice (kind, name, user_id, message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(kind.as_str())
        .bind(&request.name)
        .bind(user_id)
        .bind(request.message.trim())
        .bind(now)
        .execute(&self.db)
        .await?;

        Ok(Notice {
            id: result.last_insert_rowid(),
            kind: kind.as_str().to_string(),
            name: request.name,
            user_id: user_id.map(str::to_string),
            message: request.message.trim().to_string(),
            created_at: now,
        })
    }

    /// List queued notices, optionally narrowed to one kind, newest first
    pub async fn list(&self, kind: Option<NoticeKind>, limit: i64) -> ApiResult<Vec<Notice>> {
        let limit = limit.clamp(1, 500);

        let notices = match kind {
            Some(kind) => {
                sqlx::query_as::<_, Notice>(
                    "SELECT * FROM notice WHERE kind = ?1 ORDER BY created_at DESC LIMIT ?2",
                )
                .bind(kind.as_str())
                .bind(limit)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, Notice>(
                    "SELECT * FROM notice ORDER BY created_at DESC LIMIT ?1",
                )
                .bind(limit)
                .fetch_all(&self.db)
                .await?
            }
        };

        Ok(notices)
    }
}
