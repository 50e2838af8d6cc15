//! Client side of the trim endpoint.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use trim_core::{ExportRequest, Player, Session};
use trim_transport::{MediaAsset, wire};
use trim_transport::wire::ErrorBody;

pub struct TrimClient {
    client: reqwest::Client,
    endpoint: String,
}

impl TrimClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("trim-preview/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("cannot build http client")?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), wire::TRIM_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post the source audio and committed bounds, and wrap the returned audio.
    pub async fn trim(&self, request: &ExportRequest) -> anyhow::Result<MediaAsset> {
        let source = &request.asset;
        let (start_time, end_time) = request.form_values();

        let audio = Part::bytes(source.bytes().to_vec())
            .file_name(format!("source.{}", wire::extension_for(source.content_type())))
            .mime_str(source.content_type())
            .with_context(|| format!("invalid content type {:?}", source.content_type()))?;
        let form = Form::new()
            .part(wire::FIELD_AUDIO, audio)
            .text(wire::FIELD_START_TIME, start_time)
            .text(wire::FIELD_END_TIME, end_time);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("cannot reach {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            bail!("trim failed ({status}): {}", error_message(&body));
        }

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(source.content_type())
            .to_string();
        let duration = headers
            .get(wire::TRIMMED_DURATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<f64>().ok());

        let bytes = response.bytes().await.context("cannot read trimmed audio")?;
        tracing::debug!(len = bytes.len(), ?duration, %content_type, "trimmed audio received");

        let trimmed = MediaAsset::new(bytes, content_type);
        Ok(match duration {
            Some(seconds) => trimmed.with_duration(seconds),
            None => trimmed,
        })
    }
}

/// Export the session's committed region and hand the result back to it.
///
/// Refused while another export is in flight. A failed export leaves any
/// earlier trimmed result in place.
pub async fn export_region<P: Player>(
    session: &mut Session<P>,
    client: &TrimClient,
) -> anyhow::Result<()> {
    let request = session.begin_export()?;
    tracing::info!(
        endpoint = client.endpoint(),
        start = request.region.start,
        end = request.region.end,
        "exporting region"
    );

    match client.trim(&request).await {
        Ok(trimmed) => {
            session.finish_export(Some(trimmed))?;
            Ok(())
        }
        Err(e) => {
            session.finish_export(None)?;
            Err(e)
        }
    }
}

/// Where the server's output is written: next to the preview, with the
/// extension of the returned audio type.
pub fn trimmed_path(preview: &Path, content_type: &str) -> PathBuf {
    preview.with_extension(format!("trimmed.{}", wire::extension_for(content_type)))
}

fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(body) => body.error,
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    }
}
