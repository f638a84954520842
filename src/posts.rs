/// Review posts left by customers on contractors
use crate::{
    db::models::Post,
    error::{ApiError, ApiResult},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// New review post
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub contractor_id: String,
    pub text: Option<String>,
    pub rating: i64,
}

/// One page of review posts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

/// Manages review posts and the contractor rating aggregate
pub struct PostManager {
    db: SqlitePool,
}

impl PostManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a review post and fold its rating into the contractor aggregate
    pub async fn create(&self, user_id: &str, request: CreatePostRequest) -> ApiResult<Post> {
        if !(1..=5).contains(&request.rating) {
            return Err(ApiError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        let is_contractor: Option<bool> =
            sqlx::query_scalar("SELECT is_contractor FROM account WHERE id = ?1")
                .bind(&request.contractor_id)
                .fetch_optional(&self.db)
                .await?;
        if is_contractor != Some(true) {
            return Err(ApiError::NotFound("Contractor not found".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO post (id, user_id, contractor_id, text, rating, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(&request.contractor_id)
        .bind(&request.text)
        .bind(request.rating)
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await?;

        self.refresh_rating(&request.contractor_id).await?;

        self.get(&id).await
    }

    /// Fetch one post
    pub async fn get(&self, post_id: &str) -> ApiResult<Post> {
        sqlx::query_as::<_, Post>("SELECT * FROM post WHERE id = ?1")
            .bind(post_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))
    }

    /// List a contractor's review posts, newest first
    pub async fn list_for_contractor(
        &self,
        contractor_id: &str,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> ApiResult<PostPage> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1) * limit;

        let total: i64 = sqlx::query("SELECT COUNT(*) AS n FROM post WHERE contractor_id = ?1")
            .bind(contractor_id)
            .fetch_one(&self.db)
            .await?
            .try_get("n")?;

        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM post WHERE contractor_id = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
        )
        .bind(contractor_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        let pages = if total == 0 { 0 } else { (total + limit - 1) / limit };

        Ok(PostPage {
            posts,
            total,
            page,
            pages,
        })
    }

    /// Recompute the contractor's aggregate from its current posts
    ///
    /// An unreviewed contractor keeps the default rating of 5.
    async fn refresh_rating(&self, contractor_id: &str) -> ApiResult<()> {
        sqlx::query(
            "UPDATE account SET
                rating = COALESCE((SELECT AVG(rating) FROM post WHERE contractor_id = ?1), 5),
                review_count = (SELECT COUNT(*) FROM post WHERE contractor_id = ?1)
             WHERE id = ?1",
        )
        .bind(contractor_id)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}
