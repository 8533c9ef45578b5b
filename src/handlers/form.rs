//! Reading named fields from browser form submissions.

use std::collections::HashMap;

use axum::{
    extract::{Form, FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use bytes::Bytes;

use crate::core::audio::AudioBlob;
use crate::errors::AppError;

/// Read a text field from a multipart or urlencoded body.
pub async fn text_field(request: Request, name: &str) -> Result<Option<String>, AppError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            if field.name() == Some(name) {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                return Ok(Some(value));
            }
        }
        Ok(None)
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(fields) = Form::<HashMap<String, String>>::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(fields.get(name).cloned())
    } else {
        Err(AppError::BadRequest(
            "Expected a multipart/form-data or application/x-www-form-urlencoded body".to_string(),
        ))
    }
}

/// Pull the named file part out of a multipart body.
pub async fn audio_field(multipart: &mut Multipart, name: &str) -> Result<Option<AudioBlob>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(name) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data: Bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let mut blob = AudioBlob::new(data, content_type);
        if let Some(file_name) = file_name {
            blob = blob.with_file_name(file_name);
        }
        return Ok(Some(blob));
    }
    Ok(None)
}
