// THEORY:
// The proxy client talks to the optional captioning/generation services. It is
// the only part of the crate that touches the network, and it sits behind the
// `GenerationProxy` trait so the session can be driven by a stub in tests.
//
// Key architectural principles:
// 1.  **Never Fatal**: Every failure is a `ProxyError`. The session turns any of
//     them into a local synthetic overlay; nothing here can end an analysis.
// 2.  **Queue Aware**: The edit endpoint normally resolves the generation queue
//     itself and answers with a finished image URL. A proxy that forwards the
//     queue instead answers with a `request_id`; its status lives at
//     `{edit endpoint}/requests/{id}`, the same layout as the upstream queue.
//     Queued requests are polled at a fixed interval until a hard deadline,
//     after which the wait ends in `Timeout`.
// 3.  **Clamped Requests**: Diffusion parameters are clamped to the ranges the
//     worker accepts before they are sent, so the request on the wire is the
//     request that runs.

use crate::config::ProxyConfig;
use crate::core_modules::utils::image_helper;
use crate::error::ProxyError;
use image::RgbaImage;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::future::Future;
use std::time::Duration;

type ProxyResult<T> = std::result::Result<T, ProxyError>;

const DIFFUSION_SIDE_RANGE: (u32, u32) = (128, 768);
const DIFFUSION_STEPS_RANGE: (u32, u32) = (1, 12);
const DIFFUSION_GUIDANCE_RANGE: (f32, f32) = (0.0, 7.5);
const DIFFUSION_STEPS: u32 = 6;
const DIFFUSION_GUIDANCE: f32 = 1.0;

/// Caption returned by the describe endpoint. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Description {
    pub caption: Option<String>,
    pub keywords: Vec<String>,
    pub theme: Option<String>,
}

/// The body sent to the diffusion worker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffusionRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub guidance: f32,
}

impl DiffusionRequest {
    pub fn new(prompt: &str, width: u32, height: u32) -> Self {
        Self {
            prompt: prompt.to_string(),
            width,
            height,
            steps: DIFFUSION_STEPS,
            guidance: DIFFUSION_GUIDANCE,
        }
        .clamped()
    }

    pub fn clamped(self) -> Self {
        Self {
            width: self.width.clamp(DIFFUSION_SIDE_RANGE.0, DIFFUSION_SIDE_RANGE.1),
            height: self.height.clamp(DIFFUSION_SIDE_RANGE.0, DIFFUSION_SIDE_RANGE.1),
            steps: self.steps.clamp(DIFFUSION_STEPS_RANGE.0, DIFFUSION_STEPS_RANGE.1),
            guidance: self.guidance.clamp(DIFFUSION_GUIDANCE_RANGE.0, DIFFUSION_GUIDANCE_RANGE.1),
            ..self
        }
    }
}

/// What the edit endpoint said about a request.
#[derive(Debug, Clone, PartialEq)]
pub enum EditReply {
    /// The edited image is available at this URL.
    Ready(String),
    /// The request was queued under this id.
    Queued(String),
    /// Still running; poll again.
    Pending,
}

/// Interprets one edit-endpoint response body.
pub fn parse_edit_reply(body: &Value) -> ProxyResult<EditReply> {
    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        let message = error.as_str().map_or_else(|| error.to_string(), str::to_string);
        return Err(ProxyError::Remote(message));
    }
    if let Some(url) = body.get("url").and_then(Value::as_str) {
        return Ok(EditReply::Ready(url.to_string()));
    }
    if let Some(url) = body
        .get("images")
        .and_then(|images| images.get(0))
        .and_then(|image| image.get("url"))
        .and_then(Value::as_str)
    {
        return Ok(EditReply::Ready(url.to_string()));
    }
    if let Some(id) = body.get("request_id").and_then(Value::as_str) {
        return Ok(EditReply::Queued(id.to_string()));
    }
    if body.get("status").is_some() {
        return Ok(EditReply::Pending);
    }
    Err(ProxyError::InvalidResponse(format!("no image, request id or status in {body}")))
}

/// Interprets one describe-endpoint response body.
pub fn parse_description(body: Value) -> ProxyResult<Description> {
    if let Some(error) = body.get("error").and_then(Value::as_str) {
        return Err(ProxyError::Remote(error.to_string()));
    }
    serde_json::from_value(body).map_err(|e| ProxyError::InvalidResponse(e.to_string()))
}

/// Status route of a queued edit request on a queue-forwarding proxy.
pub fn queue_status_url(edit_url: &str, request_id: &str) -> String {
    format!("{}/requests/{}", edit_url.trim_end_matches('/'), request_id)
}

/// Calls `poll` every `interval` until it yields a value or fails, giving up
/// after `deadline`. The first call happens one interval after the start.
pub async fn poll_until<T, F, Fut>(interval: Duration, deadline: Duration, mut poll: F) -> ProxyResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProxyResult<Option<T>>>,
{
    let waiting = async {
        loop {
            tokio::time::sleep(interval).await;
            match poll().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(e) => return Err(e),
            }
        }
    };
    tokio::time::timeout(deadline, waiting)
        .await
        .map_err(|_| ProxyError::Timeout(deadline))?
}

/// The remote services the session may delegate to.
pub trait GenerationProxy {
    fn describe(&self, image_data_url: &str) -> impl Future<Output = ProxyResult<Description>> + Send;

    /// Returns the URL of the edited image.
    fn edit(&self, image_data_url: &str, instruction: &str) -> impl Future<Output = ProxyResult<String>> + Send;

    /// Returns a generated image of roughly `width` x `height`.
    fn diffuse(&self, prompt: &str, width: u32, height: u32) -> impl Future<Output = ProxyResult<RgbaImage>> + Send;

    /// Downloads (or decodes, for `data:` URLs) the image at `url`.
    fn fetch_image(&self, url: &str) -> impl Future<Output = ProxyResult<RgbaImage>> + Send;
}

/// `GenerationProxy` over HTTP.
pub struct HttpProxy {
    client: reqwest::Client,
    config: ProxyConfig,
}

impl HttpProxy {
    pub fn new(config: &ProxyConfig) -> ProxyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn api_url(&self, path: &str) -> ProxyResult<String> {
        let base = self.config.api_base.as_deref().ok_or(ProxyError::NotConfigured)?;
        Ok(format!("{}/{}", base.trim_end_matches('/'), path))
    }

    async fn post_json(&self, url: &str, body: &Value) -> ProxyResult<Value> {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Ok(value),
            Err(_) if !status.is_success() => Err(ProxyError::Remote(format!("{status}: {text}"))),
            Err(e) => Err(ProxyError::InvalidResponse(e.to_string())),
        }
    }

    async fn get_json(&self, url: &str) -> ProxyResult<Value> {
        let response = self.client.get(url).send().await?;
        Ok(response.json().await?)
    }

    async fn poll_edit(&self, status_url: &str) -> ProxyResult<Option<String>> {
        match parse_edit_reply(&self.get_json(status_url).await?)? {
            EditReply::Ready(image_url) => Ok(Some(image_url)),
            EditReply::Queued(_) | EditReply::Pending => Ok(None),
        }
    }
}

impl GenerationProxy for HttpProxy {
    async fn describe(&self, image_data_url: &str) -> ProxyResult<Description> {
        let url = self.api_url("describe")?;
        let body = self.post_json(&url, &json!({ "imageDataURL": image_data_url })).await?;
        parse_description(body)
    }

    async fn edit(&self, image_data_url: &str, instruction: &str) -> ProxyResult<String> {
        let url = self.api_url("qwen-edit")?;
        let body = json!({
            "imageDataURL": image_data_url,
            "prompt": instruction,
            "steps": self.config.edit_steps,
            "guidance": self.config.edit_guidance,
        });
        let request_id = match parse_edit_reply(&self.post_json(&url, &body).await?)? {
            EditReply::Ready(image_url) => return Ok(image_url),
            EditReply::Queued(id) => id,
            EditReply::Pending => {
                return Err(ProxyError::InvalidResponse("pending reply without a request id".to_string()));
            }
        };

        info!("edit request {request_id} queued; polling");
        let status_url = queue_status_url(&url, &request_id);
        poll_until(self.config.poll_interval(), self.config.poll_deadline(), || {
            self.poll_edit(&status_url)
        })
        .await
    }

    async fn diffuse(&self, prompt: &str, width: u32, height: u32) -> ProxyResult<RgbaImage> {
        let url = self.config.diffusion_url.as_deref().ok_or(ProxyError::NotConfigured)?;
        let request = DiffusionRequest::new(prompt, width, height);
        debug!("diffusion request {}x{} steps={}", request.width, request.height, request.steps);

        let response = self.client.post(url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProxyError::Remote(format!("{status}: {text}")));
        }
        let bytes = response.bytes().await?;
        Ok(image::load_from_memory(&bytes)?.to_rgba8())
    }

    async fn fetch_image(&self, url: &str) -> ProxyResult<RgbaImage> {
        if url.starts_with("data:") {
            return image_helper::from_data_url(url).map_err(|e| ProxyError::InvalidResponse(e.to_string()));
        }
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(image::load_from_memory(&bytes)?.to_rgba8())
    }
}
