/// Contractor discovery and filtering
use crate::{
    db::models::{Account, AccountView, ContractorSummary},
    error::{ApiError, ApiResult},
};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Listing query parameters; all filters are optional and combine with AND
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractorQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Matches against fullname or email, case-insensitive substring
    pub search: Option<String>,
    pub service: Option<String>,
    pub sub_service: Option<String>,
    /// "asc" for lowest rated first; anything else sorts highest first
    pub rating_order: Option<String>,
}

/// One page of contractor results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractorPage {
    pub contractors: Vec<ContractorSummary>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

/// Read-side queries over contractor accounts
pub struct ContractorDirectory {
    db: SqlitePool,
}

impl ContractorDirectory {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// List contractors matching the query, paginated
    pub async fn list(&self, query: ContractorQuery) -> ApiResult<ContractorPage> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1) * limit;

        let mut count_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) AS n FROM account WHERE is_contractor = 1");
        push_filters(&mut count_builder, &query);

        let total: i64 = count_builder
            .build()
            .fetch_one(&self.db)
            .await?
            .try_get("n")?;

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, fullname, email, bio, image, phone, address, service, locality, rating, review_count
             FROM account WHERE is_contractor = 1",
        );
        push_filters(&mut builder, &query);

        let ascending = query.rating_order.as_deref() == Some("asc");
        if ascending {
            builder.push(" ORDER BY rating ASC, created_at DESC");
        } else {
            builder.push(" ORDER BY rating DESC, created_at DESC");
        }

        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let contractors = builder
            .build_query_as::<ContractorSummary>()
            .fetch_all(&self.db)
            .await?;

        let pages = if total == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };

        Ok(ContractorPage {
            contractors,
            total,
            page,
            pages,
        })
    }

    /// Full details for one contractor
    ///
    /// Accounts that exist but are not contractors are reported as not found,
    /// so customer profiles are never exposed through the directory.
    pub async fn details(&self, contractor_id: &str) -> ApiResult<AccountView> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM account WHERE id = ?1")
            .bind(contractor_id)
            .fetch_optional(&self.db)
            .await?
            .filter(|a| a.is_contractor)
            .ok_or_else(|| ApiError::NotFound("Contractor not found".to_string()))?;

        Ok(account.view())
    }
}

fn push_filters(builder: &mut QueryBuilder<Sqlite>, query: &ContractorQuery) {
    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        builder.push(" AND (fullname LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR email LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    if let Some(service) = query.service.as_deref().filter(|s| !s.trim().is_empty()) {
        builder.push(" AND service = ");
        builder.push_bind(service.trim().to_string());
    }

    // Sub-services are stored as a JSON array; a quoted substring match finds
    // the exact tag without a JSON extension
    if let Some(sub) = query.sub_service.as_deref().filter(|s| !s.trim().is_empty()) {
        builder.push(" AND sub_services LIKE ");
        builder.push_bind(format!("%\"{}\"%", sub.trim()));
    }
}
