use axum::{
    http::{StatusCode, header},
    response::IntoResponse,
};

/// Default document of the static site
pub const INDEX_DOCUMENT: &str = "/index.html";

pub async fn redirect_to_index() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, INDEX_DOCUMENT)])
}
