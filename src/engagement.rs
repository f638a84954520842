/// Likes and comments on review posts
use crate::{
    db::models::{Comment, Like},
    error::{map_unique_violation, ApiError, ApiResult},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// New or replacement comment text
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub text: String,
}

/// Like tally for a post, including whether the caller liked it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeSummary {
    pub count: i64,
    pub liked: bool,
}

/// Manages likes and comments
///
/// One like and one comment per user per post, enforced by unique indexes.
/// Only the author may change or remove their comment.
pub struct EngagementManager {
    db: SqlitePool,
}

impl EngagementManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    async fn post_exists(&self, post_id: &str) -> ApiResult<()> {
        let found: Option<String> = sqlx::query_scalar("SELECT id FROM post WHERE id = ?1")
            .bind(post_id)
            .fetch_optional(&self.db)
            .await?;
        found
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))
    }

    /// Like a post; liking twice is a validation error
    pub async fn add_like(&self, user_id: &str, post_id: &str) -> ApiResult<Like> {
        self.post_exists(post_id).await?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query("INSERT INTO like_mark (id, user_id, post_id, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&id)
            .bind(user_id)
            .bind(post_id)
            .bind(now)
            .execute(&self.db)
            .await
            .map_err(|e| {
                map_unique_violation(e, ApiError::Validation("Post already liked".to_string()))
            })?;

        Ok(Like {
            id,
            user_id: user_id.to_string(),
            post_id: post_id.to_string(),
            created_at: now,
        })
    }

    /// Remove the caller's like from a post
    pub async fn remove_like(&self, user_id: &str, post_id: &str) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM like_mark WHERE user_id = ?1 AND post_id = ?2")
            .bind(user_id)
            .bind(post_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Like not found".to_string()));
        }

        Ok(())
    }

    /// Like tally for a post from the caller's point of view
    pub async fn like_summary(&self, user_id: &str, post_id: &str) -> ApiResult<LikeSummary> {
        self.post_exists(post_id).await?;

        let row = sqlx::query(
            "SELECT COUNT(*) AS n,
                    SUM(CASE WHEN user_id = ?1 THEN 1 ELSE 0 END) AS mine
             FROM like_mark WHERE post_id = ?2",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&self.db)
        .await?;

        let count: i64 = row.try_get("n")?;
        let mine: i64 = row.try_get::<Option<i64>, _>("mine")?.unwrap_or(0);

        Ok(LikeSummary {
            count,
            liked: mine > 0,
        })
    }

    /// Comment on a post; a second comment from the same user is refused
    pub async fn add_comment(
        &self,
        user_id: &str,
        post_id: &str,
        request: CommentRequest,
    ) -> ApiResult<Comment> {
        if request.text.trim().is_empty() {
            return Err(ApiError::Validation("Comment text is required".to_string()));
        }
        self.post_exists(post_id).await?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO comment (id, user_id, post_id, text, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(post_id)
        .bind(request.text.trim())
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                ApiError::Validation("Post already commented on".to_string()),
            )
        })?;

        self.get_comment(&id).await
    }

    /// Replace the text of the caller's own comment
    pub async fn update_comment(
        &self,
        user_id: &str,
        comment_id: &str,
        request: CommentRequest,
    ) -> ApiResult<Comment> {
        if request.text.trim().is_empty() {
            return Err(ApiError::Validation("Comment text is required".to_string()));
        }

        let comment = self.get_comment(comment_id).await?;
        if comment.user_id != user_id {
            return Err(ApiError::Authorization(
                "Only the author can edit a comment".to_string(),
            ));
        }

        sqlx::query("UPDATE comment SET text = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(request.text.trim())
            .bind(Utc::now())
            .bind(comment_id)
            .execute(&self.db)
            .await?;

        self.get_comment(comment_id).await
    }

    /// Delete the caller's own comment
    pub async fn delete_comment(&self, user_id: &str, comment_id: &str) -> ApiResult<()> {
        let comment = self.get_comment(comment_id).await?;
        if comment.user_id != user_id {
            return Err(ApiError::Authorization(
                "Only the author can delete a comment".to_string(),
            ));
        }

        sqlx::query("DELETE FROM comment WHERE id = ?1")
            .bind(comment_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// All comments on a post, oldest first
    pub async fn list_comments(&self, post_id: &str) -> ApiResult<Vec<Comment>> {
        self.post_exists(post_id).await?;

        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comment WHERE post_id = ?1 ORDER BY created_at ASC",
        )
        .bind(post_id)
        .fetch_all(&self.db)
        .await?;

        Ok(comments)
    }

    async fn get_comment(&self, comment_id: &str) -> ApiResult<Comment> {
        sqlx::query_as::<_, Comment>("SELECT * FROM comment WHERE id = ?1")
            .bind(comment_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))
    }
}
