//! HTTP request handlers for the image upload service

use std::collections::HashMap;

use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::{
    error::{UploadError, UploadResult},
    models::{FileDescriptor, HealthResponse, StoredFile, UploadResponse},
    AppState,
};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Multipart image upload handler.
///
/// Accepts exactly one file in the configured field (`image` by default).
/// Other fields are skipped. Error bodies carry the request's `x-request-id`.
pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    match store_upload(&state, multipart).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(err) => {
            let request_id = headers
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            err.into_response_with_request_id(request_id)
        }
    }
}

async fn store_upload(state: &AppState, multipart: Multipart) -> UploadResult<UploadResponse> {
    // Size violations surface with the policy's message however they were detected
    let stored = receive_image(state, multipart)
        .await
        .map_err(|e| state.policy.on_size_exceeded(e))?;

    let url = format!(
        "{}/{}",
        state.config.upload.public_path.trim_end_matches('/'),
        stored.file_name
    );

    info!("Uploaded image available at {}", url);

    Ok(UploadResponse {
        file_name: stored.file_name,
        size: stored.size,
        mime_type: stored.mime_type,
        url,
        uploaded_at: Utc::now(),
    })
}

async fn receive_image(state: &AppState, mut multipart: Multipart) -> UploadResult<StoredFile> {
    let field_name = state.config.upload.field_name.as_str();
    let mut stored: Option<StoredFile> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                discard(stored.as_ref()).await;
                return Err(err.into());
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        if name != field_name {
            debug!("Skipping multipart field {:?}", name);
            continue;
        }

        if stored.is_some() {
            discard(stored.as_ref()).await;
            return Err(UploadError::Multipart {
                message: format!("Unexpected additional file in field {}", name),
            });
        }

        let mut descriptor = FileDescriptor::new(
            name.as_str(),
            field.content_type().unwrap_or("application/octet-stream"),
        );
        if let Some(original) = field.file_name() {
            descriptor = descriptor.with_original_name(original);
        }

        stored = Some(
            state
                .storage
                .persist(&state.policy, &descriptor, field)
                .await?,
        );
    }

    stored.ok_or_else(|| UploadError::MissingFile {
        field: field_name.to_string(),
    })
}

/// Remove an already stored file when the rest of the request fails
async fn discard(stored: Option<&StoredFile>) {
    if let Some(file) = stored {
        if let Err(err) = fs::remove_file(&file.path).await {
            warn!("Failed to discard {}: {}", file.path.display(), err);
        }
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let mut services = HashMap::new();

    services.insert(
        "upload_directory".to_string(),
        state
            .storage
            .health_check(state.policy.upload_dir())
            .await
            .is_ok(),
    );

    let all_healthy = services.values().all(|&healthy| healthy);
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if all_healthy {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    };

    (status_code, Json(response))
}
