//! HTTPS client for the hosted vision API
//!
//! Frames are uploaded as base64 JPEG data URIs in a JSON body; the
//! API key travels in an auth header.

use crate::{BoundingBox, VisionError, VisionFuture, VisionService};
use base64::Engine;
use frame_source::VideoFrame;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default request timeout for vision calls
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionClientConfig {
    /// Base URL, without trailing slash
    pub endpoint: String,
    /// API key sent with every request
    pub api_key: String,
    /// Header carrying the API key
    pub auth_header: String,
    /// Transport-level timeout (milliseconds)
    pub timeout_ms: u64,
    /// JPEG quality for uploaded frames (1-100)
    pub jpeg_quality: u8,
    /// Caption length hint ("short" or "normal")
    pub caption_length: String,
}

impl Default for VisionClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.moondream.ai/v1".to_string(),
            api_key: String::new(),
            auth_header: "X-Moondream-Auth".to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            jpeg_quality: 80,
            caption_length: "normal".to_string(),
        }
    }
}

impl VisionClientConfig {
    /// Default endpoint with the given key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    image_url: String,
    object: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    objects: Vec<BoundingBox>,
}

#[derive(Debug, Serialize)]
struct CaptionRequest<'a> {
    image_url: String,
    length: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CaptionResponse {
    caption: String,
}

/// Map a non-success HTTP status onto the error taxonomy
fn status_error(status: StatusCode, body: String) -> VisionError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => VisionError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => VisionError::RateLimited,
        _ => VisionError::Http {
            status: status.as_u16(),
            body,
        },
    }
}

/// Vision API client over reqwest
pub struct HttpVisionClient {
    config: VisionClientConfig,
    http: reqwest::Client,
}

impl HttpVisionClient {
    /// Create a new client
    pub fn new(config: VisionClientConfig) -> Result<Self, VisionError> {
        info!("Creating vision client for endpoint: {}", config.endpoint);
        if config.api_key.is_empty() {
            warn!("Vision client created without an API key; requests will be rejected");
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| VisionError::Network(e.to_string()))?;

        Ok(Self { config, http })
    }

    /// Encode a frame as a `data:` URI
    fn data_uri(&self, frame: &VideoFrame) -> Result<String, VisionError> {
        let jpeg = frame
            .encode_jpeg(self.config.jpeg_quality)
            .map_err(|e| VisionError::Encode(e.to_string()))?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(jpeg);
        Ok(format!("data:image/jpeg;base64,{}", encoded))
    }

    fn transport_error(&self, err: reqwest::Error) -> VisionError {
        if err.is_timeout() {
            VisionError::Timeout(self.config.timeout_ms)
        } else {
            VisionError::Network(err.to_string())
        }
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, VisionError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .header(self.config.auth_header.as_str(), self.config.api_key.as_str())
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Vision call {} failed with HTTP {}", path, status);
            return Err(status_error(status, body));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| VisionError::InvalidResponse(e.to_string()))
    }
}

impl VisionService for HttpVisionClient {
    fn detect<'a>(
        &'a self,
        frame: &'a VideoFrame,
        class_name: &'a str,
    ) -> VisionFuture<'a, Vec<BoundingBox>> {
        Box::pin(async move {
            let request = DetectRequest {
                image_url: self.data_uri(frame)?,
                object: class_name,
                stream: false,
            };
            let response: DetectResponse = self.post("detect", &request).await?;
            debug!("Detected {} '{}' objects", response.objects.len(), class_name);
            Ok(response.objects)
        })
    }

    fn caption<'a>(&'a self, frame: &'a VideoFrame) -> VisionFuture<'a, String> {
        Box::pin(async move {
            let request = CaptionRequest {
                image_url: self.data_uri(frame)?,
                length: &self.config.caption_length,
                stream: false,
            };
            let response: CaptionResponse = self.post("caption", &request).await?;
            Ok(response.caption.trim().to_string())
        })
    }
}
