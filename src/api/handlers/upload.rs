use crate::AppState;
use crate::api::error::AppError;
use crate::config::WidgetConfig;
use axum::{
    Json,
    extract::{Multipart, State},
};
use futures::TryStreamExt;
use serde::Serialize;
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

/// Upload acknowledgement. Serializes to `{}`.
#[derive(Serialize, ToSchema, Debug, Default)]
pub struct UploadAck {}

/// Multipart body accepted by `/upload`.
#[derive(ToSchema)]
pub struct UploadForm {
    /// Any number of file parts, under any field name
    #[schema(value_type = Vec<String>, format = Binary)]
    pub files: Vec<Vec<u8>>,
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data", description = "One or more file parts"),
    responses(
        (status = 200, description = "All files stored", body = UploadAck),
        (status = 400, description = "Malformed body or rejected filename", body = crate::api::error::ErrorBody),
        (status = 413, description = "Body exceeds the configured limit", body = crate::api::error::ErrorBody),
        (status = 500, description = "A file could not be stored", body = crate::api::error::ErrorBody)
    ),
    tag = "upload"
)]
pub async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadAck>, AppError> {
    let mut batch = state.uploads.begin();

    while let Some(field) = multipart
        .next_field()
        .await
        .inspect_err(|e| warn!("Malformed multipart body: {}", e))?
    {
        let field_name = field.name().unwrap_or_default().to_string();

        let Some(original_name) = field.file_name().map(str::to_string) else {
            debug!("Ignoring form field {:?}", field_name);
            continue;
        };
        if original_name.is_empty() {
            debug!("Skipping empty file input {:?}", field_name);
            continue;
        }

        let body = field.map_err(std::io::Error::other);
        batch
            .receive(&field_name, &original_name, Box::new(StreamReader::new(body)))
            .await
            .inspect_err(|e| warn!("Aborting upload: {}", e))?;
    }

    let report = batch.finish().await;
    match report.error {
        Some(e) => Err(e.into()),
        None => {
            for file in &report.stored {
                debug!(?file, "Upload record");
            }
            info!("Upload complete: {} file(s) stored", report.stored.len());
            Ok(Json(UploadAck::default()))
        }
    }
}

#[utoipa::path(
    get,
    path = "/upload/config",
    responses(
        (status = 200, description = "Options for the browser file-input widget", body = WidgetConfig)
    ),
    tag = "upload"
)]
pub async fn widget_config(State(state): State<AppState>) -> Json<WidgetConfig> {
    Json(state.config.widget.clone())
}
