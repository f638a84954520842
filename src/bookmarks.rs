/// Contractor bookmarks
use crate::{
    db::models::ContractorSummary,
    error::{is_unique_violation, ApiError, ApiResult},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Result of a bookmark toggle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkToggle {
    pub bookmarked: bool,
}

/// One page of bookmarked contractors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkPage {
    pub contractors: Vec<ContractorSummary>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

/// Manages per-user contractor bookmarks
pub struct BookmarkManager {
    db: SqlitePool,
}

impl BookmarkManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Toggle a bookmark on a contractor
    ///
    /// Removing first and inserting only when nothing was removed makes the
    /// toggle safe under concurrent requests; the unique index absorbs the
    /// remaining race.
    pub async fn toggle(&self, user_id: &str, contractor_id: &str) -> ApiResult<BookmarkToggle> {
        let exists: Option<bool> = sqlx::query_scalar(
            "SELECT is_contractor FROM account WHERE id = ?1",
        )
        .bind(contractor_id)
        .fetch_optional(&self.db)
        .await?;

        if exists != Some(true) {
            return Err(ApiError::NotFound("Contractor not found".to_string()));
        }

        let removed = sqlx::query("DELETE FROM bookmark WHERE user_id = ?1 AND contractor_id = ?2")
            .bind(user_id)
            .bind(contractor_id)
            .execute(&self.db)
            .await?;

        if removed.rows_affected() > 0 {
            return Ok(BookmarkToggle { bookmarked: false });
        }

        let inserted = sqlx::query(
            "INSERT INTO bookmark (id, user_id, contractor_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(contractor_id)
        .bind(Utc::now())
        .execute(&self.db)
        .await;

        match inserted {
            Ok(_) => Ok(BookmarkToggle { bookmarked: true }),
            // A concurrent toggle inserted it first; the end state matches
            Err(e) if is_unique_violation(&e) => Ok(BookmarkToggle { bookmarked: true }),
            Err(e) => Err(ApiError::Database(e)),
        }
    }

    /// List the caller's bookmarked contractors, newest bookmark first
    pub async fn list(&self, user_id: &str, page: Option<i64>, limit: Option<i64>) -> ApiResult<BookmarkPage> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1) * limit;

        let total: i64 = sqlx::query("SELECT COUNT(*) AS n FROM bookmark WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?
            .try_get("n")?;

        let contractors = sqlx::query_as::<_, ContractorSummary>(
            "SELECT a.id, a.fullname, a.email, a.bio, a.image, a.phone, a.address, a.service, a.locality, a.rating, a.review_count
             FROM bookmark b JOIN account a ON a.id = b.contractor_id
             WHERE b.user_id = ?1
             ORDER BY b.created_at DESC
             LIMIT ?2 OFFSET ?3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        let pages = if total == 0 { 0 } else { (total + limit - 1) / limit };

        Ok(BookmarkPage {
            contractors,
            total,
            page,
            pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountManager, BecomeContractorRequest, RegisterRequest};
    use crate::config::test_config;
    use crate::db::test_pool;
    use crate::tokens::TokenIssuer;

    async fn setup() -> (AccountManager, BookmarkManager) {
        let pool = test_pool().await;
        let tokens = TokenIssuer::new(&test_config().authentication);
        (
            AccountManager::new(pool.clone(), tokens),
            BookmarkManager::new(pool),
        )
    }

    async fn register(mgr: &AccountManager, email: &str) -> String {
        mgr.register(
            RegisterRequest {
                fullname: "Someone".to_string(),
                email: email.to_string(),
                password: "password-long-enough".to_string(),
                phone: None,
                address: None,
                dob: None,
                nickname: None,
                bio: None,
            },
            None,
        )
        .await
        .unwrap()
        .user
        .id
    }

    async fn make_contractor(mgr: &AccountManager, email: &str) -> String {
        let id = register(mgr, email).await;
        mgr.become_contractor(
            &id,
            BecomeContractorRequest {
                service: "Roofing".to_string(),
                sub_services: vec![],
                price: "50".to_string(),
                unit: "hour".to_string(),
                locality: None,
                about: "roofs".to_string(),
                availability: None,
            },
            None,
        )
        .await
        .unwrap();
        id
    }

    #[tokio::test]
    async fn test_toggle_on_and_off() {
        let (mgr, bookmarks) = setup().await;
        let user = register(&mgr, "u@x.com").await;
        let contractor = make_contractor(&mgr, "c@x.com").await;

        let first = bookmarks.toggle(&user, &contractor).await.unwrap();
        assert!(first.bookmarked);

        let listed = bookmarks.list(&user, None, None).await.unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.contractors[0].id, contractor);

        let second = bookmarks.toggle(&user, &contractor).await.unwrap();
        assert!(!second.bookmarked);
        assert_eq!(bookmarks.list(&user, None, None).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_toggle_unknown_contractor() {
        let (mgr, bookmarks) = setup().await;
        let user = register(&mgr, "u2@x.com").await;

        // Missing account and plain customer both count as not found
        assert!(bookmarks.toggle(&user, "missing-id").await.is_err());
        let customer = register(&mgr, "plain@x.com").await;
        assert!(bookmarks.toggle(&user, &customer).await.is_err());
    }
}
