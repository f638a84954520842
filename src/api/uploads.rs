/// Multipart form collection
use crate::error::{ApiError, ApiResult};
use axum::extract::Multipart;
use std::collections::HashMap;

/// One uploaded file from a multipart body
#[derive(Debug)]
pub struct UploadedFile {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Text fields and at most one file collected from a multipart body
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl MultipartForm {
    pub fn required(&self, name: &str) -> ApiResult<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Validation(format!("Missing field: {}", name)))
    }

    pub fn optional(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Drain a multipart body into text fields and at most one file part
///
/// Parts with a filename are treated as the upload; later file parts replace
/// earlier ones. Parts larger than `max_file_size` are rejected before the
/// store is touched.
pub async fn collect_multipart(
    mut multipart: Multipart,
    max_file_size: usize,
) -> ApiResult<MultipartForm> {
    let mut form = MultipartForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_some() {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read upload: {}", e)))?;

            if data.len() > max_file_size {
                return Err(ApiError::Validation(format!(
                    "Upload exceeds maximum size of {} bytes",
                    max_file_size
                )));
            }

            form.file = Some(UploadedFile {
                data: data.to_vec(),
                content_type,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read field {}: {}", name, e)))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}
