/// Contractor discovery endpoints
use crate::{
    api::{resolve_account_images, resolve_summary_images},
    context::AppContext,
    db::models::AccountView,
    directory::{ContractorPage, ContractorQuery},
    error::ApiResult,
    posts::PostPage,
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

/// Build contractor routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/contractors", get(list_contractors))
        .route("/contractors/:id", get(contractor_details))
        .route("/contractors/:id/posts", get(contractor_posts))
}

/// Paginated, filtered contractor listing
async fn list_contractors(
    State(ctx): State<AppContext>,
    Query(query): Query<ContractorQuery>,
) -> ApiResult<Json<ContractorPage>> {
    let mut page = ctx.directory.list(query).await?;
    resolve_summary_images(&ctx.images, &mut page.contractors);
    Ok(Json(page))
}

/// Full public profile for one contractor
async fn contractor_details(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<AccountView>> {
    let mut view = ctx.directory.details(&id).await?;
    resolve_account_images(&ctx.images, &mut view);
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<i64>,
    limit: Option<i64>,
}

/// Review posts for one contractor
async fn contractor_posts(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PostPage>> {
    // 404s for unknown or non-contractor targets before listing
    ctx.directory.details(&id).await?;
    let page = ctx.posts.list_for_contractor(&id, query.page, query.limit).await?;
    Ok(Json(page))
}
