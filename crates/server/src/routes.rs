use axum::extract::State;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::http::{HeaderName, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use trim_pipeline::TrimRange;
use trim_transport::wire;

use crate::AppState;
use crate::error::ApiError;

pub async fn health() -> &'static str {
    "OK"
}

struct TrimForm {
    audio: Bytes,
    content_type: String,
    start: String,
    end: String,
}

async fn read_form(mut multipart: Multipart) -> Result<TrimForm, ApiError> {
    let mut audio = None;
    let mut start = None;
    let mut end = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            wire::FIELD_AUDIO => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                audio = Some((field.bytes().await?, content_type));
            }
            wire::FIELD_START_TIME => start = Some(field.text().await?),
            wire::FIELD_END_TIME => end = Some(field.text().await?),
            _ => {}
        }
    }

    match (audio, start, end) {
        (Some((audio, content_type)), Some(start), Some(end)) => Ok(TrimForm {
            audio,
            content_type,
            start,
            end,
        }),
        _ => Err(ApiError::BadRequest("Missing required fields".into())),
    }
}

/// Duration of the trimmed output, when the decoder understands it.
async fn probe(bytes: Bytes, content_type: String) -> Option<f64> {
    let result =
        tokio::task::spawn_blocking(move || trim_decode::probe_duration(&bytes, &content_type))
            .await;

    match result {
        Ok(Ok(duration)) => Some(duration),
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "could not probe trimmed output");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "probe task failed");
            None
        }
    }
}

pub async fn trim_audio(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let form = read_form(multipart?).await?;

    let trimmed = state
        .trimmer
        .trim_raw(form.audio, &form.content_type, &form.start, &form.end)
        .await?;

    let probed = probe(trimmed.clone(), form.content_type.clone()).await;
    if let Ok(range) = TrimRange::parse(&form.start, &form.end) {
        tracing::info!(
            requested = range.duration(),
            probed = probed.unwrap_or(f64::NAN),
            "trimmed duration"
        );
    }

    let content_type = HeaderValue::from_str(&form.content_type)
        .unwrap_or(HeaderValue::from_static(wire::MIME_MPEG));
    let disposition = HeaderValue::from_str(&wire::content_disposition(&form.content_type))
        .unwrap_or(HeaderValue::from_static("attachment"));

    let mut response = (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        trimmed,
    )
        .into_response();

    if let Some(duration) = probed {
        if let Ok(value) = HeaderValue::from_str(&format!("{duration:.3}")) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(wire::TRIMMED_DURATION_HEADER), value);
        }
    }

    Ok(response)
}
