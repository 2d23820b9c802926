use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::{error::AppResult, services::sitemap_service, state::AppState};

#[utoipa::path(
    get,
    path = "/sitemap.xml",
    responses(
        (status = 200, description = "XML sitemap", content_type = "application/xml", body = String),
    ),
    tag = "Health"
)]
pub async fn sitemap(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let xml = sitemap_service::build_sitemap(&state).await?;
    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml))
}
