/// Authentication extractors
use crate::{
    api::middleware::extract_bearer_token,
    context::AppContext,
    error::ApiError,
    tokens::TokenKind,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Authenticated session - extracts and verifies the bearer access token
///
/// A missing or malformed header is a 401; a token that fails verification
/// (expired included) is a 403 so the client knows to run the refresh flow.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub account_id: String,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Authentication("Missing authorization header".to_string()))?;

        let claims = state
            .tokens
            .verify(TokenKind::Access, &token)
            .map_err(|_| ApiError::SessionExpired)?;

        Ok(AuthSession {
            account_id: claims.sub,
            email: claims.email,
        })
    }
}
