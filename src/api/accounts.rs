/// Account and session endpoints
use crate::{
    account::{
        AvailabilityCheckRequest, AvailabilityRequest, BecomeContractorRequest,
        BulkRegisterOutcome, FederatedLoginRequest, FederatedSessionResponse, LoginRequest,
        RefreshRequest, RegisterRequest, SessionResponse, UpdateProfileRequest,
    },
    api::{
        middleware::Json,
        resolve_account_images,
        uploads::{collect_multipart, MultipartForm},
    },
    auth::AuthSession,
    context::AppContext,
    db::models::AccountView,
    error::{ApiError, ApiResult},
    tokens::TokenPair,
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};

/// Build account routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/register", post(register))
        .route("/register-with-image", post(register_with_image))
        .route("/bulk-register", post(bulk_register))
        .route("/login", post(login))
        .route("/auth/google", post(google_auth))
        .route("/refresh", post(refresh))
        .route("/isAvailable", post(is_available))
        .route("/me", get(me))
        .route("/update-user", put(update_user))
        .route("/update-with-image", put(update_with_image))
        .route("/delete-user/:id", delete(delete_user))
        .route("/user/:id/become-contractor", post(become_contractor))
        .route("/user/availability", put(set_availability))
}

/// Register endpoint
async fn register(
    State(ctx): State<AppContext>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    tracing::info!("register: new account for {}", req.email);
    let mut session = ctx.accounts.register(req, None).await?;
    resolve_account_images(&ctx.images, &mut session.user);
    Ok((StatusCode::CREATED, Json(session)))
}

/// Register with a profile image in one multipart request
///
/// The image is stored first; if the account write fails the upload is
/// discarded so no orphan file remains.
async fn register_with_image(
    State(ctx): State<AppContext>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let form = collect_multipart(multipart, ctx.images.max_size()).await?;
    let req = register_request_from(&form)?;

    let image = match form.file {
        Some(file) => Some(ctx.images.store_upload(file.data, &file.content_type).await?),
        None => None,
    };

    match ctx.accounts.register(req, image.clone()).await {
        Ok(mut session) => {
            resolve_account_images(&ctx.images, &mut session.user);
            Ok((StatusCode::CREATED, Json(session)))
        }
        Err(e) => {
            if let Some(name) = image {
                if let Err(cleanup) = ctx.images.discard(&name).await {
                    tracing::warn!("register_with_image: failed to discard upload {}: {}", name, cleanup);
                }
            }
            Err(e)
        }
    }
}

/// Bulk registration; always 207 with a per-entry report
async fn bulk_register(
    State(ctx): State<AppContext>,
    Json(requests): Json<Vec<RegisterRequest>>,
) -> ApiResult<(StatusCode, Json<Vec<BulkRegisterOutcome>>)> {
    if requests.is_empty() {
        return Err(ApiError::Validation("No accounts to register".to_string()));
    }
    let mut outcomes = ctx.accounts.register_bulk(requests).await;
    for outcome in &mut outcomes {
        if let Some(user) = outcome.user.as_mut() {
            resolve_account_images(&ctx.images, user);
        }
    }
    Ok((StatusCode::MULTI_STATUS, Json(outcomes)))
}

/// Login endpoint
async fn login(
    State(ctx): State<AppContext>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let mut session = ctx.accounts.login(req).await?;
    resolve_account_images(&ctx.images, &mut session.user);
    Ok(Json(session))
}

/// Federated Google login; registers on first sight of the email
async fn google_auth(
    State(ctx): State<AppContext>,
    Json(req): Json<FederatedLoginRequest>,
) -> ApiResult<(StatusCode, Json<FederatedSessionResponse>)> {
    let identity = ctx
        .identity
        .verify_id_token(&req.token)
        .await
        .map_err(|e| match e {
            // Provider rejections surface as a bad request, not an auth failure
            ApiError::Authentication(msg) => ApiError::Validation(msg),
            other => other,
        })?;

    let mut session = ctx.accounts.federated_login(identity).await?;
    resolve_account_images(&ctx.images, &mut session.user);
    let status = if session.is_new_account {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(session)))
}

/// Refresh endpoint; rotates the stored refresh token
async fn refresh(
    State(ctx): State<AppContext>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    let pair = ctx.accounts.refresh(&req.refresh_token).await?;
    Ok(Json(pair))
}

/// Email availability probe
#[derive(Debug, Serialize, Deserialize)]
struct AvailabilityResponse {
    available: bool,
}

async fn is_available(
    State(ctx): State<AppContext>,
    Json(req): Json<AvailabilityCheckRequest>,
) -> ApiResult<Json<AvailabilityResponse>> {
    let available = ctx.accounts.email_available(&req.email).await?;
    Ok(Json(AvailabilityResponse { available }))
}

/// Current account with a fresh token pair
async fn me(
    State(ctx): State<AppContext>,
    auth: AuthSession,
) -> ApiResult<Json<SessionResponse>> {
    let mut session = ctx
        .accounts
        .current_session(&auth.account_id)
        .await
        .map_err(|e| match e {
            // The token outlived the account
            ApiError::NotFound(_) => ApiError::Authentication("Account no longer exists".to_string()),
            other => other,
        })?;
    resolve_account_images(&ctx.images, &mut session.user);
    Ok(Json(session))
}

/// Sparse profile update
async fn update_user(
    State(ctx): State<AppContext>,
    auth: AuthSession,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<AccountView>> {
    let (account, _) = ctx.accounts.update_profile(&auth.account_id, req, None).await?;
    let mut view = account.view();
    resolve_account_images(&ctx.images, &mut view);
    Ok(Json(view))
}

/// Profile update with a replacement image
async fn update_with_image(
    State(ctx): State<AppContext>,
    auth: AuthSession,
    multipart: Multipart,
) -> ApiResult<Json<AccountView>> {
    let form = collect_multipart(multipart, ctx.images.max_size()).await?;
    let req = update_request_from(&form);

    let image = match form.file {
        Some(file) => Some(ctx.images.store_upload(file.data, &file.content_type).await?),
        None => None,
    };

    match ctx.accounts.update_profile(&auth.account_id, req, image.clone()).await {
        Ok((account, replaced)) => {
            if let Some(old) = replaced {
                // Best-effort removal of the superseded image
                if let Err(e) = ctx.images.discard(&old).await {
                    tracing::warn!("update_with_image: failed to discard old image {}: {}", old, e);
                }
            }
            let mut view = account.view();
            resolve_account_images(&ctx.images, &mut view);
            Ok(Json(view))
        }
        Err(e) => {
            if let Some(name) = image {
                if let Err(cleanup) = ctx.images.discard(&name).await {
                    tracing::warn!("update_with_image: failed to discard upload {}: {}", name, cleanup);
                }
            }
            Err(e)
        }
    }
}

/// Hard account deletion; callers may only delete themselves
async fn delete_user(
    State(ctx): State<AppContext>,
    auth: AuthSession,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    if id != auth.account_id {
        return Err(ApiError::Authorization(
            "Cannot delete another account".to_string(),
        ));
    }

    let image = ctx.accounts.delete_account(&id).await?;
    if let Some(name) = image {
        if let Err(e) = ctx.images.discard(&name).await {
            tracing::warn!("delete_user: failed to discard image {}: {}", name, e);
        }
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Flip the caller's contractor availability flag
async fn set_availability(
    State(ctx): State<AppContext>,
    auth: AuthSession,
    Json(req): Json<AvailabilityRequest>,
) -> ApiResult<Json<AccountView>> {
    let account = ctx
        .accounts
        .set_availability(&auth.account_id, req.availability)
        .await?;
    let mut view = account.view();
    resolve_account_images(&ctx.images, &mut view);
    Ok(Json(view))
}

/// Contractor activation with an optional supporting document
async fn become_contractor(
    State(ctx): State<AppContext>,
    auth: AuthSession,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<AccountView>> {
    if id != auth.account_id {
        return Err(ApiError::Authorization(
            "Cannot modify another account".to_string(),
        ));
    }

    let form = collect_multipart(multipart, ctx.images.max_size()).await?;
    let req = contractor_request_from(&form)?;

    // The supporting document is best-effort; a failed upload does not block
    // activation
    let file = match form.file {
        Some(file) => match ctx.images.store_upload(file.data, &file.content_type).await {
            Ok(name) => Some(name),
            Err(e) => {
                tracing::warn!("become_contractor: document upload failed: {}", e);
                None
            }
        },
        None => None,
    };

    let account = ctx.accounts.become_contractor(&id, req, file).await?;
    let mut view = account.view();
    resolve_account_images(&ctx.images, &mut view);
    Ok(Json(view))
}

fn register_request_from(form: &MultipartForm) -> ApiResult<RegisterRequest> {
    Ok(RegisterRequest {
        fullname: form.required("fullname")?,
        email: form.required("email")?,
        password: form.required("password")?,
        phone: form.optional("phone"),
        address: form.optional("address"),
        dob: form.optional("dob"),
        nickname: form.optional("nickname"),
        bio: form.optional("bio"),
    })
}

fn update_request_from(form: &MultipartForm) -> UpdateProfileRequest {
    UpdateProfileRequest {
        fullname: form.optional("fullname"),
        email: form.optional("email"),
        password: form.optional("password"),
        bio: form.optional("bio"),
        phone: form.optional("phone"),
        address: form.optional("address"),
        dob: form.optional("dob"),
        nickname: form.optional("nickname"),
    }
}

fn contractor_request_from(form: &MultipartForm) -> ApiResult<BecomeContractorRequest> {
    // Tags arrive as a comma-separated field
    let sub_services = form
        .optional("subServices")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(BecomeContractorRequest {
        service: form.required("service")?,
        sub_services,
        price: form.required("price")?,
        unit: form.required("unit")?,
        locality: form.optional("locality"),
        about: form.required("about")?,
        availability: form
            .optional("availability")
            .and_then(|v| v.parse::<bool>().ok()),
    })
}
