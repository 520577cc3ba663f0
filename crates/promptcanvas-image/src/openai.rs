use async_trait::async_trait;
use serde_json::json;

use crate::{ImageRequest, ImageService};
use promptcanvas_types::{Artifact, CanvasError};

const PROVIDER: &str = "openai";

// ---------------------------------------------------------------------------
// OpenAiImageAdapter
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct OpenAiImageAdapter {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    default_model: String,
    default_size: String,
}

impl OpenAiImageAdapter {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            base_url: "https://api.openai.com".to_string(),
            default_model: "dall-e-3".to_string(),
            default_size: "1024x1024".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn model_for<'a>(&'a self, request: &'a ImageRequest) -> &'a str {
        request.model.as_deref().unwrap_or(&self.default_model)
    }

    fn build_request_body(&self, request: &ImageRequest) -> serde_json::Value {
        json!({
            "model": self.model_for(request),
            "prompt": request.prompt,
            "n": 1,
            "size": request.size.as_deref().unwrap_or(&self.default_size),
        })
    }

    fn parse_response(
        &self,
        body: serde_json::Value,
        model: &str,
    ) -> Result<Artifact, CanvasError> {
        let image = body["data"]
            .as_array()
            .and_then(|data| data.first())
            .ok_or_else(|| CanvasError::ProviderError {
                provider: PROVIDER.into(),
                status: 200,
                message: "Response contained no images".into(),
                retryable: false,
            })?;

        // Hosted URL when available, otherwise inline bytes as a data URL.
        let url = image["url"].as_str().map(String::from).or_else(|| {
            image["b64_json"]
                .as_str()
                .map(|b64| format!("data:image/png;base64,{b64}"))
        });

        let created_at = body["created"]
            .as_i64()
            .and_then(|secs| chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0))
            .unwrap_or_else(chrono::Utc::now);

        Ok(Artifact {
            id: format!("{PROVIDER}-{}", uuid::Uuid::new_v4()),
            url,
            revised_prompt: image["revised_prompt"].as_str().map(String::from),
            model: model.to_string(),
            provider: PROVIDER.into(),
            created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn map_error(status: reqwest::StatusCode, body: &str) -> CanvasError {
    let status_u16 = status.as_u16();
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    match status_u16 {
        429 => {
            let retry_ms = parsed
                .as_ref()
                .and_then(|v| v["error"]["retry_after"].as_f64())
                .map(|s| (s * 1000.0) as u64)
                .unwrap_or(1000);
            CanvasError::RateLimited {
                provider: PROVIDER.into(),
                retry_after_ms: retry_ms,
            }
        }
        401 => CanvasError::AuthError {
            provider: PROVIDER.into(),
        },
        400 => {
            let code = parsed.as_ref().and_then(|v| v["error"]["code"].as_str());
            if code == Some("content_policy_violation") {
                CanvasError::ContentPolicy {
                    provider: PROVIDER.into(),
                    message: extract_error_message(body),
                }
            } else {
                CanvasError::ProviderError {
                    provider: PROVIDER.into(),
                    status: 400,
                    message: extract_error_message(body),
                    retryable: false,
                }
            }
        }
        500 | 502 | 503 => CanvasError::ProviderError {
            provider: PROVIDER.into(),
            status: status_u16,
            message: extract_error_message(body),
            retryable: true,
        },
        _ => CanvasError::ProviderError {
            provider: PROVIDER.into(),
            status: status_u16,
            message: extract_error_message(body),
            retryable: false,
        },
    }
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

// ---------------------------------------------------------------------------
// ImageService implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl ImageService for OpenAiImageAdapter {
    async fn generate(&self, request: &ImageRequest) -> Result<Artifact, CanvasError> {
        let body = self.build_request_body(request);

        let resp = self
            .client
            .post(format!("{}/v1/images/generations", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CanvasError::ProviderError {
                provider: PROVIDER.into(),
                status: 0,
                message: e.to_string(),
                retryable: true,
            })?;

        let status = resp.status();
        let response_body = resp.text().await.map_err(|e| CanvasError::ProviderError {
            provider: PROVIDER.into(),
            status: 0,
            message: e.to_string(),
            retryable: true,
        })?;

        if !status.is_success() {
            return Err(map_error(status, &response_body));
        }

        let json: serde_json::Value =
            serde_json::from_str(&response_body).map_err(|e| CanvasError::ProviderError {
                provider: PROVIDER.into(),
                status: status.as_u16(),
                message: format!("Failed to parse response JSON: {e}"),
                retryable: false,
            })?;

        self.parse_response(json, self.model_for(request))
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_request_body_uses_adapter_defaults() {
        let adapter = OpenAiImageAdapter::new("test-key".into());
        let body = adapter.build_request_body(&ImageRequest::new("a cat riding a bicycle"));

        assert_eq!(
            body,
            json!({
                "model": "dall-e-3",
                "prompt": "a cat riding a bicycle",
                "n": 1,
                "size": "1024x1024",
            })
        );
    }

    #[test]
    fn build_request_body_honours_request_overrides() {
        let adapter = OpenAiImageAdapter::new("test-key".into());
        let req = ImageRequest::new("sunset")
            .with_model("dall-e-2")
            .with_size("256x256");
        let body = adapter.build_request_body(&req);

        assert_eq!(body["model"], "dall-e-2");
        assert_eq!(body["size"], "256x256");
    }

    #[test]
    fn with_base_url_strips_trailing_slash() {
        let adapter =
            OpenAiImageAdapter::new("k".into()).with_base_url("http://localhost:9000/".into());
        assert_eq!(adapter.base_url, "http://localhost:9000");
    }

    #[test]
    fn parse_response_with_url() {
        let adapter = OpenAiImageAdapter::new("k".into());
        let artifact = adapter
            .parse_response(
                json!({
                    "created": 1_700_000_000,
                    "data": [{
                        "url": "https://images.example/cat.png",
                        "revised_prompt": "A cat riding a red bicycle"
                    }]
                }),
                "dall-e-3",
            )
            .unwrap();

        assert_eq!(artifact.url.as_deref(), Some("https://images.example/cat.png"));
        assert_eq!(
            artifact.revised_prompt.as_deref(),
            Some("A cat riding a red bicycle")
        );
        assert_eq!(artifact.model, "dall-e-3");
        assert_eq!(artifact.provider, "openai");
        assert_eq!(artifact.created_at.timestamp(), 1_700_000_000);
        assert!(artifact.id.starts_with("openai-"));
    }

    #[test]
    fn parse_response_with_inline_bytes() {
        let adapter = OpenAiImageAdapter::new("k".into());
        let artifact = adapter
            .parse_response(json!({ "data": [{ "b64_json": "iVBORw0KGgo=" }] }), "dall-e-2")
            .unwrap();
        assert_eq!(
            artifact.url.as_deref(),
            Some("data:image/png;base64,iVBORw0KGgo=")
        );
    }

    #[test]
    fn parse_response_without_images_is_an_error() {
        let adapter = OpenAiImageAdapter::new("k".into());
        let err = adapter
            .parse_response(json!({ "created": 1, "data": [] }), "dall-e-3")
            .unwrap_err();
        assert!(matches!(
            err,
            CanvasError::ProviderError { retryable: false, .. }
        ));
    }

    #[test]
    fn map_error_rate_limited_reads_retry_after() {
        let err = map_error(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"slow down","retry_after":2.5}}"#,
        );
        assert!(matches!(
            err,
            CanvasError::RateLimited { retry_after_ms: 2500, .. }
        ));
    }

    #[test]
    fn map_error_auth() {
        let err = map_error(reqwest::StatusCode::UNAUTHORIZED, "{}");
        assert!(matches!(err, CanvasError::AuthError { provider } if provider == "openai"));
    }

    #[test]
    fn map_error_content_policy() {
        let err = map_error(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error":{"code":"content_policy_violation","message":"Your request was rejected"}}"#,
        );
        match err {
            CanvasError::ContentPolicy { message, .. } => {
                assert_eq!(message, "Your request was rejected")
            }
            other => panic!("expected ContentPolicy, got {other:?}"),
        }
    }

    #[test]
    fn map_error_plain_bad_request_is_not_retryable() {
        let err = map_error(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"size must be one of 256x256, 512x512"}}"#,
        );
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("size must be one of"));
    }

    #[test]
    fn map_error_server_errors_are_retryable() {
        let err = map_error(reqwest::StatusCode::SERVICE_UNAVAILABLE, "upstream down");
        assert!(err.is_retryable());
        assert!(err.to_string().contains("upstream down"));
    }
}
