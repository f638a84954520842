/// Stored image serving
use crate::{
    context::AppContext,
    error::{ApiError, ApiResult},
    image_store::store::content_type_for,
};
use axum::{
    extract::{Path, State},
    http::header,
    response::Response,
    routing::get,
    Router,
};

/// Build image routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/images/:name", get(serve_image))
}

/// Serve stored image bytes with the content type implied by the name
async fn serve_image(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    // Names are uuid-with-extension; reject anything that could traverse
    if name.contains('/') || name.contains("..") {
        return Err(ApiError::Validation("Invalid image name".to_string()));
    }

    let bytes = ctx
        .images
        .fetch(&name)
        .await?
        .ok_or_else(|| ApiError::NotFound("Image not found".to_string()))?;

    Response::builder()
        .header(header::CONTENT_TYPE, content_type_for(&name))
        .body(bytes.into())
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}
