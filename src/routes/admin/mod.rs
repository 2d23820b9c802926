//! Back-office endpoints. Every handler requires a bearer token; the role a
//! route needs (staff, manager or admin) is enforced in the service layer.

use axum::Router;

use crate::state::AppState;

pub mod attributes;
pub mod blog;
pub mod catalog;
pub mod collections;
pub mod dashboard;
pub mod flash_sales;
pub mod newsletter;
pub mod orders;
pub mod reviews;
pub mod seo;
pub mod settings;
pub mod users;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(dashboard::router())
        .merge(orders::router())
        .merge(catalog::router())
        .merge(attributes::router())
        .merge(collections::router())
        .merge(flash_sales::router())
        .merge(reviews::router())
        .merge(blog::router())
        .merge(seo::router())
        .merge(newsletter::router())
        .merge(settings::router())
        .merge(users::router())
}
