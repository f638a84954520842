/// Access and refresh token issuance and verification
///
/// Both token kinds carry the same claims shape but are signed with
/// independent secrets, so one kind can never be presented as the other.
use crate::config::AuthConfig;
use crate::error::{ApiError, ApiResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Which signing secret and lifetime a token uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims embedded in every token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// An access/refresh pair minted together
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and verifies session tokens
#[derive(Clone)]
pub struct TokenIssuer {
    access_secret: String,
    refresh_secret: String,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_secret: config.access_token_secret.clone(),
            refresh_secret: config.refresh_token_secret.clone(),
            access_lifetime: Duration::days(config.access_token_lifetime_days),
            refresh_lifetime: Duration::days(config.refresh_token_lifetime_days),
        }
    }

    fn secret(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Access => &self.access_secret,
            TokenKind::Refresh => &self.refresh_secret,
        }
    }

    fn lifetime(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_lifetime,
            TokenKind::Refresh => self.refresh_lifetime,
        }
    }

    /// Sign a token of the given kind for an account
    pub fn issue(&self, kind: TokenKind, account_id: &str, email: &str) -> ApiResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: account_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.lifetime(kind)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret(kind).as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Mint a fresh access/refresh pair for an account
    pub fn issue_pair(&self, account_id: &str, email: &str) -> ApiResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue(TokenKind::Access, account_id, email)?,
            refresh_token: self.issue(TokenKind::Refresh, account_id, email)?,
        })
    }

    /// Verify a token against the secret for its kind
    ///
    /// Expired, tampered, and wrong-kind tokens all fail verification; the
    /// caller chooses the error shape for its flow.
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret(kind).as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}
