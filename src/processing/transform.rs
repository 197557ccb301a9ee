// src/processing/transform.rs

//! Client for the external image transform service.
//!
//! The service follows the Tinify REST model: a source image is submitted
//! once (`POST /shrink`), the response's `Location` header identifies the
//! compressed source, and every derived size is requested from that location
//! with a resize instruction.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::LOCATION;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::core::{Dimensions, TransformConfig};
use crate::utils::ServiceError;

/// Where the service should read the source image from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A url the service can fetch itself
    Url(String),
    /// Raw image bytes uploaded with the request
    Bytes(Vec<u8>),
}

/// Service-side reference to a submitted source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHandle {
    pub location: String,
}

/// Compresses and resizes images.
pub trait TransformService {
    fn submit(&self, source: ImageSource) -> Result<SourceHandle, ServiceError>;

    /// Scales the source to fit inside `dimensions`, keeping its aspect ratio.
    fn fit(&self, source: &SourceHandle, dimensions: Dimensions) -> Result<Vec<u8>, ServiceError>;
}

impl<T: TransformService + ?Sized> TransformService for &T {
    fn submit(&self, source: ImageSource) -> Result<SourceHandle, ServiceError> {
        (**self).submit(source)
    }

    fn fit(&self, source: &SourceHandle, dimensions: Dimensions) -> Result<Vec<u8>, ServiceError> {
        (**self).fit(source, dimensions)
    }
}

/// Error body returned by the service.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

/// Blocking HTTP client for a Tinify-compatible endpoint.
pub struct TinifyClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl TinifyClient {
    pub fn new(config: &TransformConfig) -> Result<Self, ServiceError> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| ServiceError::Unreachable(format!("Failed to build http client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.basic_auth("api", Some(&self.api_key))
    }
}

impl TransformService for TinifyClient {
    fn submit(&self, source: ImageSource) -> Result<SourceHandle, ServiceError> {
        let request = self.authorized(self.http.post(format!("{}/shrink", self.endpoint)));
        let request = match source {
            ImageSource::Url(url) => {
                debug!("Submitting {} to transform service", url);
                request.json(&json!({ "source": { "url": url } }))
            }
            ImageSource::Bytes(bytes) => {
                debug!("Submitting {} bytes to transform service", bytes.len());
                request.body(bytes)
            }
        };

        let response = check_status(send(request)?)?;
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ServiceError::UnexpectedResponse("missing Location header".to_string()))?;

        Ok(SourceHandle {
            location: location.to_string(),
        })
    }

    fn fit(&self, source: &SourceHandle, dimensions: Dimensions) -> Result<Vec<u8>, ServiceError> {
        let request = self.authorized(self.http.post(&source.location)).json(&json!({
            "resize": {
                "method": "fit",
                "width": dimensions.width,
                "height": dimensions.height,
            }
        }));

        let response = check_status(send(request)?)?;
        let bytes = response
            .bytes()
            .map_err(|e| ServiceError::Unreachable(e.to_string()))?;
        debug!("Received {} bytes for {}", bytes.len(), dimensions);
        Ok(bytes.to_vec())
    }
}

fn send(request: RequestBuilder) -> Result<Response, ServiceError> {
    request
        .send()
        .map_err(|e| ServiceError::Unreachable(e.to_string()))
}

fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().unwrap_or_default();
    Err(classify_failure(status, &text))
}

/// Maps an unsuccessful response to a service error.
pub(crate) fn classify_failure(status: StatusCode, body: &str) -> ServiceError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.message.is_empty() => parsed.message,
        Ok(parsed) if !parsed.error.is_empty() => parsed.error,
        _ => body.trim().to_string(),
    };

    match status {
        StatusCode::UNAUTHORIZED => ServiceError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => ServiceError::QuotaExceeded(message),
        status if status.is_server_error() => ServiceError::Server {
            status: status.as_u16(),
            message,
        },
        status => ServiceError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}
