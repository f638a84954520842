/// Review post, like and comment endpoints
use crate::{
    api::middleware::Json,
    auth::AuthSession,
    context::AppContext,
    db::models::{Comment, Like, Post},
    engagement::{CommentRequest, LikeSummary},
    error::ApiResult,
    posts::CreatePostRequest,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Router,
};

/// Build post and engagement routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/posts", post(create_post))
        .route("/posts/:id/likes", post(add_like).delete(remove_like).get(like_summary))
        .route("/posts/:id/comments", post(add_comment).get(list_comments))
        .route("/comments/:id", put(update_comment).delete(delete_comment))
}

/// Leave a review post on a contractor
async fn create_post(
    State(ctx): State<AppContext>,
    auth: AuthSession,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let post = ctx.posts.create(&auth.account_id, req).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn add_like(
    State(ctx): State<AppContext>,
    auth: AuthSession,
    Path(post_id): Path<String>,
) -> ApiResult<(StatusCode, Json<Like>)> {
    let like = ctx.engagement.add_like(&auth.account_id, &post_id).await?;
    Ok((StatusCode::CREATED, Json(like)))
}

async fn remove_like(
    State(ctx): State<AppContext>,
    auth: AuthSession,
    Path(post_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    ctx.engagement.remove_like(&auth.account_id, &post_id).await?;
    Ok(Json(serde_json::json!({ "removed": true })))
}

async fn like_summary(
    State(ctx): State<AppContext>,
    auth: AuthSession,
    Path(post_id): Path<String>,
) -> ApiResult<Json<LikeSummary>> {
    let summary = ctx.engagement.like_summary(&auth.account_id, &post_id).await?;
    Ok(Json(summary))
}

async fn add_comment(
    State(ctx): State<AppContext>,
    auth: AuthSession,
    Path(post_id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = ctx.engagement.add_comment(&auth.account_id, &post_id, req).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn list_comments(
    State(ctx): State<AppContext>,
    _auth: AuthSession,
    Path(post_id): Path<String>,
) -> ApiResult<Json<Vec<Comment>>> {
    let comments = ctx.engagement.list_comments(&post_id).await?;
    Ok(Json(comments))
}

async fn update_comment(
    State(ctx): State<AppContext>,
    auth: AuthSession,
    Path(comment_id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<Json<Comment>> {
    let comment = ctx
        .engagement
        .update_comment(&auth.account_id, &comment_id, req)
        .await?;
    Ok(Json(comment))
}

async fn delete_comment(
    State(ctx): State<AppContext>,
    auth: AuthSession,
    Path(comment_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    ctx.engagement.delete_comment(&auth.account_id, &comment_id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
