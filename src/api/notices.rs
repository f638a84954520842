/// Notice queue endpoints
use crate::{
    api::middleware::Json,
    context::AppContext,
    db::models::Notice,
    error::ApiResult,
    notices::{NoticeKind, NoticeRequest},
};
use axum::{
    extract::State,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};

/// Build notice routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/delete-account", post(request_deletion))
        .route("/help", post(request_help))
        .route("/report", post(submit_report))
}

/// Notice submission body; the queue is open to unauthenticated callers so
/// the account id travels in the body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoticeBody {
    name: Option<String>,
    user_id: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
struct NoticeAck {
    received: bool,
    id: i64,
}

async fn request_deletion(
    State(ctx): State<AppContext>,
    Json(body): Json<NoticeBody>,
) -> ApiResult<Json<NoticeAck>> {
    submit(&ctx, NoticeKind::Delete, body).await
}

async fn request_help(
    State(ctx): State<AppContext>,
    Json(body): Json<NoticeBody>,
) -> ApiResult<Json<NoticeAck>> {
    submit(&ctx, NoticeKind::Help, body).await
}

async fn submit_report(
    State(ctx): State<AppContext>,
    Json(body): Json<NoticeBody>,
) -> ApiResult<Json<NoticeAck>> {
    submit(&ctx, NoticeKind::Report, body).await
}

async fn submit(ctx: &AppContext, kind: NoticeKind, body: NoticeBody) -> ApiResult<Json<NoticeAck>> {
    let notice: Notice = ctx
        .notices
        .submit(
            kind,
            body.user_id.as_deref(),
            NoticeRequest {
                name: body.name,
                message: body.message,
            },
        )
        .await?;

    Ok(Json(NoticeAck {
        received: true,
        id: notice.id,
    }))
}
