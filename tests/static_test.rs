use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use datenzaepfchen::config::ServerConfig;
use datenzaepfchen::{AppState, create_app};
use http_body_util::BodyExt;
use serde_json::Value;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

const INDEX_HTML: &str = "<!DOCTYPE html><html><body><input id=\"upload\" type=\"file\" multiple></body></html>";
const SITE_CSS: &str = "body { margin: 0; }";

async fn setup() -> (TempDir, Router) {
    let _ = tracing_subscriber::fmt::try_init();
    let root = tempfile::tempdir().unwrap();
    let config = ServerConfig::development(root.path());

    std::fs::create_dir_all(config.assets_dir.join("css")).unwrap();
    std::fs::write(config.assets_dir.join("index.html"), INDEX_HTML).unwrap();
    std::fs::write(config.assets_dir.join("css").join("site.css"), SITE_CSS).unwrap();

    let state = AppState::from_config(config).await.unwrap();
    (root, create_app(state))
}

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

#[tokio::test]
async fn test_root_redirects_to_index() {
    let (_root, app) = setup().await;

    let response = get(&app, "/").await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/index.html");

    let response = get(&app, response.headers()[header::LOCATION].to_str().unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_asset_is_served_with_one_year_cache() {
    let (_root, app) = setup().await;

    let response = get(&app, "/index.html").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=31557600"
    );
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );
    assert_eq!(body_bytes(response).await, INDEX_HTML.as_bytes());
}

#[tokio::test]
async fn test_nested_stylesheet() {
    let (_root, app) = setup().await;

    let response = get(&app, "/css/site.css").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/css")
    );
    assert_eq!(body_bytes(response).await, SITE_CSS.as_bytes());
}

/// Collects formatted log output of the current thread.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn test_stylesheet_request_is_logged() {
    let (_root, app) = setup().await;
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let response = get(&app, "/css/site.css").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(logs.contents().contains("The file site.css was requested."));

    let response = get(&app, "/index.html").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!logs.contents().contains("index.html was requested"));
}

#[tokio::test]
async fn test_missing_asset_is_not_found() {
    let (_root, app) = setup().await;

    let response = get(&app, "/js/missing.js").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (_root, app) = setup().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/index.html")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    let response = get(&app, "/index.html").await;
    let generated = response.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());
}

#[tokio::test]
async fn test_widget_config() {
    let (_root, app) = setup().await;

    let response = get(&app, "/upload/config").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["uploadUrl"], "/upload");
    assert_eq!(json["language"], "de");
    assert_eq!(json["uploadAsync"], false);
    assert_eq!(json["minFileCount"], 1);
    assert_eq!(json["maxFileCount"], 5);
}

#[tokio::test]
async fn test_health() {
    let (_root, app) = setup().await;

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["upload_dir"], "writable");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_openapi_document() {
    let (_root, app) = setup().await;

    let response = get(&app, "/api-docs/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(json["paths"]["/upload"]["post"].is_object());
    assert!(json["paths"]["/upload/config"]["get"].is_object());
    assert!(json["paths"]["/health"]["get"].is_object());
}
