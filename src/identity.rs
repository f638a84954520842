/// Federated identity verification
///
/// Google ID tokens are checked against the tokeninfo endpoint rather than
/// verified locally, so key rotation is Google's problem. The trait seam lets
/// tests substitute a canned verifier.
use crate::config::IdentityConfig;
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use serde::Deserialize;

/// Identity asserted by a federated provider
#[derive(Debug, Clone)]
pub struct FederatedIdentity {
    pub email: String,
    pub fullname: String,
    pub picture: Option<String>,
}

/// Verifies a provider-issued ID token and extracts the identity it asserts
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify_id_token(&self, id_token: &str) -> ApiResult<FederatedIdentity>;
}

/// Response shape of Google's tokeninfo endpoint, trimmed to what we use
#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Verifier backed by Google's tokeninfo endpoint
pub struct GoogleVerifier {
    client: reqwest::Client,
    tokeninfo_url: String,
    client_id: String,
}

impl GoogleVerifier {
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            tokeninfo_url: config.google_tokeninfo_url.clone(),
            client_id: config.google_client_id.clone(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for GoogleVerifier {
    async fn verify_id_token(&self, id_token: &str) -> ApiResult<FederatedIdentity> {
        let response = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("Identity provider unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::Authentication(
                "Federated token rejected by provider".to_string(),
            ));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("Bad identity provider response: {}", e)))?;

        // A valid Google token for someone else's app is still not ours
        if !self.client_id.is_empty() && info.aud != self.client_id {
            return Err(ApiError::Authentication(
                "Federated token audience mismatch".to_string(),
            ));
        }

        Ok(FederatedIdentity {
            email: info.email,
            fullname: info.name.unwrap_or_else(|| "Google User".to_string()),
            picture: info.picture,
        })
    }
}
