/// Account manager implementation using runtime queries
use crate::{
    account::{
        BecomeContractorRequest, BulkRegisterOutcome, FederatedSessionResponse, LoginRequest,
        RegisterRequest, SessionResponse, UpdateProfileRequest,
    },
    db::models::{encode_tags, Account},
    error::{map_unique_violation, ApiError, ApiResult},
    identity::FederatedIdentity,
    password,
    tokens::{TokenIssuer, TokenKind, TokenPair},
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::{Validate, ValidateEmail};

/// Account manager service
///
/// Uniqueness of email is enforced by the schema's unique index; this manager
/// treats a unique-violation on write as the authoritative duplicate signal
/// rather than pre-checking.
pub struct AccountManager {
    db: SqlitePool,
    tokens: TokenIssuer,
}

/// Lowercase, trimmed canonical form used for all email storage and lookups
fn canonical_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AccountManager {
    pub fn new(db: SqlitePool, tokens: TokenIssuer) -> Self {
        Self { db, tokens }
    }

    /// Register a new account and mint its first session
    pub async fn register(
        &self,
        request: RegisterRequest,
        image: Option<String>,
    ) -> ApiResult<SessionResponse> {
        request
            .validate()
            .map_err(|e| ApiError::Validation(e.to_string()))?;

        let email = canonical_email(&request.email);
        let password_hash = password::hash_password(&request.password)?;

        let id = Uuid::new_v4().to_string();
        let pair = self.tokens.issue_pair(&id, &email)?;
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO account (id, fullname, email, password_hash, refresh_token, bio, image, phone, address, dob, nickname, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&id)
        .bind(request.fullname.trim())
        .bind(&email)
        .bind(&password_hash)
        .bind(&pair.refresh_token)
        .bind(&request.bio)
        .bind(&image)
        .bind(&request.phone)
        .bind(&request.address)
        .bind(&request.dob)
        .bind(&request.nickname)
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, ApiError::DuplicateEmail))?;

        let account = self.get_account(&id).await?;

        Ok(SessionResponse {
            user: account.view(),
            tokens: pair,
        })
    }

    /// Register several accounts sequentially, collecting per-entry outcomes
    pub async fn register_bulk(
        &self,
        requests: Vec<RegisterRequest>,
    ) -> Vec<BulkRegisterOutcome> {
        let mut outcomes = Vec::with_capacity(requests.len());

        for request in requests {
            let email = request.email.clone();
            match self.register(request, None).await {
                Ok(session) => outcomes.push(BulkRegisterOutcome {
                    email,
                    success: true,
                    user: Some(session.user),
                    error: None,
                }),
                Err(e) => outcomes.push(BulkRegisterOutcome {
                    email,
                    success: false,
                    user: None,
                    error: Some(e.to_string()),
                }),
            }
        }

        outcomes
    }

    /// Authenticate by email and password
    ///
    /// Unknown email and wrong password produce the same error, so callers
    /// cannot probe which emails are registered.
    pub async fn login(&self, request: LoginRequest) -> ApiResult<SessionResponse> {
        let email = canonical_email(&request.email);

        let account = self
            .find_by_email(&email)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;

        // Federated-only accounts have no password to check
        let hash = account
            .password_hash
            .as_deref()
            .ok_or(ApiError::InvalidCredentials)?;

        if !password::verify_password(&request.password, hash)? {
            return Err(ApiError::InvalidCredentials);
        }

        let pair = self.rotate_session(&account.id, &account.email).await?;

        Ok(SessionResponse {
            user: account.view(),
            tokens: pair,
        })
    }

    /// Log in or register through a verified federated identity
    ///
    /// A matching email joins the existing account; otherwise a passwordless
    /// account is created on the spot.
    pub async fn federated_login(
        &self,
        identity: FederatedIdentity,
    ) -> ApiResult<FederatedSessionResponse> {
        let email = canonical_email(&identity.email);

        if let Some(account) = self.find_by_email(&email).await? {
            let pair = self.rotate_session(&account.id, &account.email).await?;
            return Ok(FederatedSessionResponse {
                user: account.view(),
                tokens: pair,
                is_new_account: false,
            });
        }

        let id = Uuid::new_v4().to_string();
        let pair = self.tokens.issue_pair(&id, &email)?;
        let now = Utc::now();

        let inserted = sqlx::query(
            "INSERT INTO account (id, fullname, email, refresh_token, image, social_auth_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&id)
        .bind(&identity.fullname)
        .bind(&email)
        .bind(&pair.refresh_token)
        .bind(&identity.picture)
        .bind("google")
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await;

        match inserted {
            Ok(_) => {}
            Err(e) => {
                // A concurrent registration won the email; fall back to login
                let err = map_unique_violation(e, ApiError::DuplicateEmail);
                if matches!(err, ApiError::DuplicateEmail) {
                    let account = self
                        .find_by_email(&email)
                        .await?
                        .ok_or(ApiError::InvalidCredentials)?;
                    let pair = self.rotate_session(&account.id, &account.email).await?;
                    return Ok(FederatedSessionResponse {
                        user: account.view(),
                        tokens: pair,
                        is_new_account: false,
                    });
                }
                return Err(err);
            }
        }

        let account = self.get_account(&id).await?;

        Ok(FederatedSessionResponse {
            user: account.view(),
            tokens: pair,
            is_new_account: true,
        })
    }

    /// Exchange a refresh token for a new pair, invalidating the old one
    ///
    /// Rotation is a single conditional update comparing the presented token
    /// against the stored one, so a superseded token loses atomically.
    pub async fn refresh(&self, presented: &str) -> ApiResult<TokenPair> {
        let claims = self
            .tokens
            .verify(TokenKind::Refresh, presented)
            .map_err(|_| ApiError::InvalidRefreshToken)?;

        let pair = self.tokens.issue_pair(&claims.sub, &claims.email)?;
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE account SET refresh_token = ?1, updated_at = ?2 WHERE id = ?3 AND refresh_token = ?4",
        )
        .bind(&pair.refresh_token)
        .bind(now)
        .bind(&claims.sub)
        .bind(presented)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::InvalidRefreshToken);
        }

        Ok(pair)
    }

    /// Return the caller's account with a fresh token pair
    pub async fn current_session(&self, account_id: &str) -> ApiResult<SessionResponse> {
        let account = self.get_account(account_id).await?;
        let pair = self.rotate_session(&account.id, &account.email).await?;

        Ok(SessionResponse {
            user: account.view(),
            tokens: pair,
        })
    }

    /// Apply a partial profile update in one write
    ///
    /// Returns the updated account and the previous image name when the image
    /// was replaced, so the caller can discard the orphaned file.
    pub async fn update_profile(
        &self,
        account_id: &str,
        request: UpdateProfileRequest,
        image: Option<String>,
    ) -> ApiResult<(Account, Option<String>)> {
        let before = self.get_account(account_id).await?;

        if let Some(fullname) = request.fullname.as_deref() {
            if fullname.trim().is_empty() {
                return Err(ApiError::Validation("Full name cannot be empty".to_string()));
            }
        }

        let email = match request.email.as_deref() {
            Some(raw) => {
                let email = canonical_email(raw);
                if !email.validate_email() {
                    return Err(ApiError::Validation("Invalid email address".to_string()));
                }
                Some(email)
            }
            None => None,
        };

        let password_hash = match request.password.as_deref() {
            Some(plain) => {
                if plain.len() < 8 {
                    return Err(ApiError::Validation(
                        "Password must be at least 8 characters".to_string(),
                    ));
                }
                Some(password::hash_password(plain)?)
            }
            None => None,
        };

        let now = Utc::now();
        sqlx::query(
            "UPDATE account SET
                fullname = COALESCE(?1, fullname),
                email = COALESCE(?2, email),
                password_hash = COALESCE(?3, password_hash),
                bio = COALESCE(?4, bio),
                phone = COALESCE(?5, phone),
                address = COALESCE(?6, address),
                dob = COALESCE(?7, dob),
                nickname = COALESCE(?8, nickname),
                image = COALESCE(?9, image),
                updated_at = ?10
             WHERE id = ?11",
        )
        .bind(request.fullname.as_deref().map(str::trim))
        .bind(&email)
        .bind(&password_hash)
        .bind(&request.bio)
        .bind(&request.phone)
        .bind(&request.address)
        .bind(&request.dob)
        .bind(&request.nickname)
        .bind(&image)
        .bind(now)
        .bind(account_id)
        .execute(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, ApiError::DuplicateEmail))?;

        let replaced = match (&image, &before.image) {
            (Some(_), Some(old)) => Some(old.clone()),
            _ => None,
        };

        let account = self.get_account(account_id).await?;
        Ok((account, replaced))
    }

    /// Upgrade the account to a contractor listing
    pub async fn become_contractor(
        &self,
        account_id: &str,
        request: BecomeContractorRequest,
        contractor_file: Option<String>,
    ) -> ApiResult<Account> {
        request
            .validate()
            .map_err(|e| ApiError::Validation(e.to_string()))?;

        // Fails with NotFound before touching anything else
        self.get_account(account_id).await?;

        let now = Utc::now();
        sqlx::query(
            "UPDATE account SET
                is_contractor = 1,
                service = ?1,
                sub_services = ?2,
                price = ?3,
                unit = ?4,
                locality = ?5,
                availability = ?6,
                about = ?7,
                contractor_file = COALESCE(?8, contractor_file),
                updated_at = ?9
             WHERE id = ?10",
        )
        .bind(&request.service)
        .bind(encode_tags(&request.sub_services))
        .bind(&request.price)
        .bind(&request.unit)
        .bind(&request.locality)
        .bind(request.availability.unwrap_or(true))
        .bind(&request.about)
        .bind(&contractor_file)
        .bind(now)
        .bind(account_id)
        .execute(&self.db)
        .await?;

        self.get_account(account_id).await
    }

    /// Flip contractor availability
    pub async fn set_availability(&self, account_id: &str, available: bool) -> ApiResult<Account> {
        let account = self.get_account(account_id).await?;
        if !account.is_contractor {
            return Err(ApiError::Validation(
                "Only contractors have availability".to_string(),
            ));
        }

        sqlx::query("UPDATE account SET availability = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(available)
            .bind(Utc::now())
            .bind(account_id)
            .execute(&self.db)
            .await?;

        self.get_account(account_id).await
    }

    /// Hard-delete the account and everything hanging off it
    ///
    /// Returns the image name, if any, so the stored file can be removed.
    pub async fn delete_account(&self, account_id: &str) -> ApiResult<Option<String>> {
        let account = self.get_account(account_id).await?;

        let mut tx = self.db.begin().await?;

        sqlx::query(
            "DELETE FROM like_mark WHERE user_id = ?1
             OR post_id IN (SELECT id FROM post WHERE user_id = ?1 OR contractor_id = ?1)",
        )
        .bind(account_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM comment WHERE user_id = ?1
             OR post_id IN (SELECT id FROM post WHERE user_id = ?1 OR contractor_id = ?1)",
        )
        .bind(account_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM post WHERE user_id = ?1 OR contractor_id = ?1")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM bookmark WHERE user_id = ?1 OR contractor_id = ?1")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM account WHERE id = ?1")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(account.image)
    }

    /// Existence probe by email; a taken email is an answer, not an error
    pub async fn email_available(&self, email: &str) -> ApiResult<bool> {
        if email.trim().is_empty() {
            return Err(ApiError::Validation("Email is required".to_string()));
        }
        Ok(self.find_by_email(&canonical_email(email)).await?.is_none())
    }

    /// Fetch an account by id
    pub async fn get_account(&self, account_id: &str) -> ApiResult<Account> {
        sqlx::query_as::<_, Account>("SELECT * FROM account WHERE id = ?1")
            .bind(account_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))
    }

    /// Fetch an account by canonical email
    pub async fn find_by_email(&self, email: &str) -> ApiResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM account WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(account)
    }

    /// Mint a pair and store its refresh token as the account's only one
    async fn rotate_session(&self, account_id: &str, email: &str) -> ApiResult<TokenPair> {
        let pair = self.tokens.issue_pair(account_id, email)?;

        sqlx::query("UPDATE account SET refresh_token = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(&pair.refresh_token)
            .bind(Utc::now())
            .bind(account_id)
            .execute(&self.db)
            .await?;

        Ok(pair)
    }
}
