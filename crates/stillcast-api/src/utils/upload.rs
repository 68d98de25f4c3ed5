//! Common utilities for file upload handlers

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;

use stillcast_core::AppError;

use crate::error::HttpAppError;

/// Extractor yielding `Some(Multipart)` only when the request actually
/// carries a multipart body; other content types (or none) yield `None` so
/// the handler can fall back to the `url` query parameter.
pub struct MaybeMultipart(pub Option<Multipart>);

impl<S> FromRequest<S> for MaybeMultipart
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.trim_start().starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            return Ok(MaybeMultipart(None));
        }

        let multipart = Multipart::from_request(req, state).await.map_err(|e| {
            HttpAppError(AppError::InvalidInput(format!(
                "Invalid multipart request: {}",
                e
            )))
        })?;
        Ok(MaybeMultipart(Some(multipart)))
    }
}

/// Extract file data and declared filename from a multipart form.
/// Only one field named "file" is accepted; multiple file fields are rejected.
/// Returns `None` when the form carries no file field at all.
pub async fn extract_multipart_file(
    mut multipart: Multipart,
) -> Result<Option<(Vec<u8>, String)>, AppError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if field_name == "file" {
            if file_data.is_some() {
                return Err(AppError::InvalidInput(
                    "Multiple file fields are not allowed; send exactly one field named 'file'"
                        .to_string(),
                ));
            }
            filename = field.file_name().map(|s: &str| s.to_string());

            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?;

            file_data = Some(data.to_vec());
        }
    }

    let Some(file_data) = file_data else {
        return Ok(None);
    };

    let original_filename = filename.unwrap_or_else(|| "unknown".to_string());
    Ok(Some((file_data, original_filename)))
}
