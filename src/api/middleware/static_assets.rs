use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::path::Path;
use tracing::info;

/// Marks successful static responses cacheable for `max_age` seconds.
pub async fn cache_control(State(max_age): State<u64>, req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    let status = response.status();
    if status.is_success() || status == StatusCode::NOT_MODIFIED {
        if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", max_age)) {
            response.headers_mut().insert(header::CACHE_CONTROL, value);
        }
    }

    response
}

/// Logs requests for stylesheets.
pub async fn log_stylesheet_requests(req: Request, next: Next) -> Response {
    if let Some(filename) = stylesheet_name(req.uri().path()) {
        info!("The file {} was requested.", filename);
    }
    next.run(req).await
}

fn stylesheet_name(path: &str) -> Option<String> {
    let path = Path::new(path);
    let is_css = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("css"));
    if !is_css {
        return None;
    }
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}
