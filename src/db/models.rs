/// Database models and outward-facing projections
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account record in the database
///
/// `password_hash` is absent for federated-only accounts. `refresh_token`
/// holds the single active refresh token; it is overwritten on every
/// login/refresh, never appended to.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: String,
    pub fullname: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub refresh_token: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub dob: Option<String>,
    pub nickname: Option<String>,
    pub social_auth_name: Option<String>,
    pub is_contractor: bool,
    pub service: Option<String>,
    /// JSON array of sub-service tags
    pub sub_services: Option<String>,
    pub price: Option<String>,
    pub unit: Option<String>,
    pub locality: Option<String>,
    pub availability: Option<bool>,
    pub about: Option<String>,
    pub contractor_file: Option<String>,
    pub rating: f64,
    pub review_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Public-safe projection with credential fields stripped
    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id.clone(),
            fullname: self.fullname.clone(),
            email: self.email.clone(),
            bio: self.bio.clone(),
            image: self.image.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            dob: self.dob.clone(),
            nickname: self.nickname.clone(),
            is_contractor: self.is_contractor,
            service: self.service.clone(),
            sub_services: decode_tags(self.sub_services.as_deref()),
            price: self.price.clone(),
            unit: self.unit.clone(),
            locality: self.locality.clone(),
            availability: self.availability,
            about: self.about.clone(),
            contractor_file: self.contractor_file.clone(),
            rating: self.rating,
            review_count: self.review_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Outward-facing account representation
///
/// This is the only account shape that crosses the HTTP boundary; it has no
/// password hash and no refresh token by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: String,
    pub fullname: String,
    pub email: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub dob: Option<String>,
    pub nickname: Option<String>,
    pub is_contractor: bool,
    pub service: Option<String>,
    pub sub_services: Vec<String>,
    pub price: Option<String>,
    pub unit: Option<String>,
    pub locality: Option<String>,
    pub availability: Option<bool>,
    pub about: Option<String>,
    pub contractor_file: Option<String>,
    pub rating: f64,
    pub review_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trimmed contractor projection for listings and bookmark joins
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractorSummary {
    pub id: String,
    pub fullname: String,
    pub email: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub service: Option<String>,
    pub locality: Option<String>,
    pub rating: f64,
    pub review_count: i64,
}

/// Review post left by a customer on a contractor
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub contractor_id: String,
    pub text: Option<String>,
    pub rating: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment on a post; at most one per user per post
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Like on a post; at most one per user per post
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

/// Bookmark from a customer to a contractor
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub contractor_id: String,
    pub created_at: DateTime<Utc>,
}

/// Queued notice awaiting out-of-band handling
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: i64,
    pub kind: String,
    pub name: Option<String>,
    pub user_id: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Decode a JSON tag array column; malformed or missing data reads as empty
pub fn decode_tags(raw: Option<&str>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

/// Encode sub-service tags for storage
pub fn encode_tags(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}
