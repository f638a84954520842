/// Account management module
pub mod manager;

pub use manager::AccountManager;

use crate::db::models::AccountView;
use crate::tokens::TokenPair;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// New account registration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub fullname: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub dob: Option<String>,
    pub nickname: Option<String>,
    pub bio: Option<String>,
}

/// Password login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Federated login carrying a provider-issued ID token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederatedLoginRequest {
    pub token: String,
}

/// Email availability probe
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityCheckRequest {
    pub email: String,
}

/// Token refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Partial profile update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub dob: Option<String>,
    pub nickname: Option<String>,
}

/// Upgrade a customer account to a contractor listing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BecomeContractorRequest {
    #[validate(length(min = 1, message = "Service is required"))]
    pub service: String,
    #[serde(default)]
    pub sub_services: Vec<String>,
    #[validate(length(min = 1, message = "Price is required"))]
    pub price: String,
    #[validate(length(min = 1, message = "Unit is required"))]
    pub unit: String,
    pub locality: Option<String>,
    #[validate(length(min = 1, message = "About is required"))]
    pub about: String,
    pub availability: Option<bool>,
}

/// Toggle contractor availability
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub availability: bool,
}

/// Account plus a freshly minted token pair
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: AccountView,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Federated session response; marks whether the account was just created
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederatedSessionResponse {
    pub user: AccountView,
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub is_new_account: bool,
}

/// Outcome for a single entry of a bulk registration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRegisterOutcome {
    pub email: String,
    pub success: bool,
    pub user: Option<AccountView>,
    pub error: Option<String>,
}
