/// Bookmark endpoints
use crate::{
    api::{middleware::Json, resolve_summary_images},
    auth::AuthSession,
    bookmarks::{BookmarkPage, BookmarkToggle},
    context::AppContext,
    error::ApiResult,
};
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;

/// Build bookmark routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/bookmarks", post(toggle_bookmark).get(list_bookmarks))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToggleRequest {
    contractor_id: String,
}

/// Toggle a bookmark on a contractor
async fn toggle_bookmark(
    State(ctx): State<AppContext>,
    auth: AuthSession,
    Json(req): Json<ToggleRequest>,
) -> ApiResult<Json<BookmarkToggle>> {
    let toggle = ctx.bookmarks.toggle(&auth.account_id, &req.contractor_id).await?;
    Ok(Json(toggle))
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<i64>,
    limit: Option<i64>,
}

/// The caller's bookmarked contractors
async fn list_bookmarks(
    State(ctx): State<AppContext>,
    auth: AuthSession,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<BookmarkPage>> {
    let mut page = ctx
        .bookmarks
        .list(&auth.account_id, query.page, query.limit)
        .await?;
    resolve_summary_images(&ctx.images, &mut page.contractors);
    Ok(Json(page))
}
