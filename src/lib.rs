/// CraftLink - services marketplace backend
///
/// REST API connecting contractors to customers: accounts and sessions,
/// contractor discovery, bookmarks, review posts with likes and comments,
/// and a notice queue for delete/help/report requests.

pub mod account;
pub mod api;
pub mod auth;
pub mod bookmarks;
pub mod config;
pub mod context;
pub mod db;
pub mod directory;
pub mod engagement;
pub mod error;
pub mod identity;
pub mod image_store;
pub mod notices;
pub mod password;
pub mod posts;
pub mod server;
pub mod tokens;
