/// API routes and handlers
pub mod accounts;
pub mod bookmarks;
pub mod contractors;
pub mod engagement;
pub mod images;
pub mod middleware;
pub mod notices;
pub mod uploads;

use crate::{
    context::AppContext,
    db::models::{AccountView, ContractorSummary},
    image_store::ImageStore,
};
use axum::Router;

/// Build API routes, mounted under /api/v1
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(accounts::routes())
        .merge(contractors::routes())
        .merge(bookmarks::routes())
        .merge(engagement::routes())
        .merge(notices::routes())
        .merge(images::routes())
}

/// Rewrite stored image names in an account view to public URLs
///
/// The store keeps bare names; responses carry fetchable URLs.
pub(crate) fn resolve_account_images(images: &ImageStore, view: &mut AccountView) {
    if let Some(image) = view.image.as_mut() {
        *image = images.url_for(image);
    }
    if let Some(file) = view.contractor_file.as_mut() {
        *file = images.url_for(file);
    }
}

/// Rewrite stored image names in contractor summaries to public URLs
pub(crate) fn resolve_summary_images(images: &ImageStore, summaries: &mut [ContractorSummary]) {
    for summary in summaries {
        if let Some(image) = summary.image.as_mut() {
            *image = images.url_for(image);
        }
    }
}
