//! Analysis API client, the single point of entry for all calls to
//! the remote resume-analysis service.
//!
//! ARCHITECTURAL RULE: no other module performs HTTP. Callers hand a
//! validated [`ResumeFile`] to this client and get back a normalized
//! [`AnalysisResult`] or a rejection carrying the error placeholder.
//!
//! One upload may be in flight at a time. There is no cancellation
//! and no automatic retry; a retry is a fresh call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::stream;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::analysis::AnalysisResult;
use crate::normalize::{error_result, normalize, GENERIC_UPLOAD_ERROR};
use crate::upload::ResumeFile;

const UPLOAD_PATH: &str = "/upload";
const UPLOAD_FRESH_PATH: &str = "/upload-fresh";
const ANALYTICS_PATH: &str = "/analytics";

/// Upload bodies stream in chunks of this size so progress can tick.
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Progress callback, invoked with an integer percentage in [0, 100].
/// Fire-and-forget; values are non-decreasing and end at 100 once the
/// body has been fully handed to the transport.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("an upload is already in flight")]
    UploadInFlight,

    /// The upload failed at the transport level (network error,
    /// timeout, or non-2xx status). `body` is the error placeholder,
    /// still renderable; `message` matches its `error` field.
    #[error("upload failed: {message}")]
    Upload {
        status: Option<u16>,
        message: String,
        body: AnalysisResult,
    },
}

/// Non-2xx responses carry `{ "error": "..." }` when the server had
/// something to say.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the resume-analysis endpoints.
#[derive(Clone)]
pub struct AnalysisClient {
    http: Client,
    base_url: String,
    in_flight: Arc<AtomicBool>,
}

impl AnalysisClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            http: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Uploads a resume to `POST {base}/upload` and returns the
    /// normalized analysis.
    pub async fn upload_resume(
        &self,
        file: &ResumeFile,
        on_progress: Option<ProgressFn>,
    ) -> Result<AnalysisResult, ClientError> {
        self.post_resume(UPLOAD_PATH, file, on_progress).await
    }

    /// Same contract as [`upload_resume`](Self::upload_resume), but
    /// asks the server to bypass any cached prior result.
    pub async fn upload_resume_fresh(
        &self,
        file: &ResumeFile,
        on_progress: Option<ProgressFn>,
    ) -> Result<AnalysisResult, ClientError> {
        self.post_resume(UPLOAD_FRESH_PATH, file, on_progress).await
    }

    /// Fetches `GET {base}/analytics`. Aggregate stats, shape decided
    /// by the server; passed through undecoded beyond JSON.
    pub async fn analytics(&self) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, ANALYTICS_PATH);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    async fn post_resume(
        &self,
        path: &str,
        file: &ResumeFile,
        on_progress: Option<ProgressFn>,
    ) -> Result<AnalysisResult, ClientError> {
        let _guard =
            InFlightGuard::acquire(&self.in_flight).ok_or(ClientError::UploadInFlight)?;

        let url = format!("{}{}", self.base_url, path);
        let total = file.bytes.len() as u64;
        debug!(file = %file.file_name, bytes = total, %url, "uploading resume");

        let part = Part::stream_with_length(progress_body(&file.bytes, on_progress), total)
            .file_name(file.file_name.clone())
            .mime_str(file.kind.mime())?;
        let form = Form::new().part("resume", part);

        let response = match self.http.post(&url).multipart(form).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "resume upload failed before a response arrived");
                return Err(ClientError::Upload {
                    status: None,
                    message: GENERIC_UPLOAD_ERROR.to_string(),
                    body: error_result(None),
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let server_message = serde_json::from_str::<ErrorBody>(&body_text)
                .map(|b| b.error)
                .ok();
            let message = server_message
                .clone()
                .unwrap_or_else(|| GENERIC_UPLOAD_ERROR.to_string());
            warn!(status = status.as_u16(), %message, "analysis endpoint rejected the upload");
            return Err(ClientError::Upload {
                status: Some(status.as_u16()),
                message,
                body: error_result(server_message),
            });
        }

        // A 2xx body that fails to decode counts as an absent body:
        // the normalizer substitutes the fallback, never an error.
        let raw = response.json::<Value>().await.ok();
        Ok(normalize(raw.as_ref()))
    }
}

/// Slices the payload into fixed chunks, pairing each with the
/// cumulative percentage after that chunk is sent. The last chunk is
/// always paired with 100.
fn chunk_with_progress(bytes: &Bytes) -> Vec<(Bytes, u8)> {
    let total = bytes.len();
    let mut chunks = Vec::with_capacity(total / UPLOAD_CHUNK_BYTES + 1);
    let mut offset = 0;
    while offset < total {
        let end = usize::min(offset + UPLOAD_CHUNK_BYTES, total);
        let percent = ((end as u64 * 100) / total as u64) as u8;
        chunks.push((bytes.slice(offset..end), percent));
        offset = end;
    }
    chunks
}

/// Wraps the payload in a stream that reports progress as the
/// transport pulls each chunk.
fn progress_body(bytes: &Bytes, on_progress: Option<ProgressFn>) -> Body {
    if bytes.is_empty() {
        // Validated files are never empty; still report completion.
        if let Some(cb) = &on_progress {
            cb(100);
        }
        return Body::from(Bytes::new());
    }

    let chunks = chunk_with_progress(bytes);
    Body::wrap_stream(stream::iter(chunks.into_iter().map(move |(chunk, percent)| {
        if let Some(cb) = &on_progress {
            cb(percent);
        }
        Ok::<Bytes, std::io::Error>(chunk)
    })))
}

/// Releases the upload slot when dropped, success or failure.
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
