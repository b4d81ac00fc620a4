use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::services::generator::{ImageGenerator, ImageRequest, ImageSize};

/// Image client for FAL's synchronous flux endpoints.
pub struct FalImageClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    default_steps: u32,
}

#[derive(Debug, Serialize)]
struct FluxRequest<'a> {
    prompt: &'a str,
    image_size: &'a ImageSize,
    num_inference_steps: u32,
    num_images: u32,
    enable_safety_checker: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    guidance_scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct FluxResponse {
    #[serde(default)]
    images: Vec<FluxImage>,
}

#[derive(Debug, Deserialize)]
struct FluxImage {
    url: String,
    width: Option<u32>,
    height: Option<u32>,
}

impl FalImageClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(FalImageClient {
            client,
            api_url: settings.image_api_url.clone(),
            api_key: settings.fal_key.clone(),
            default_steps: settings.diffusion_steps,
        })
    }
}

#[async_trait]
impl ImageGenerator for FalImageClient {
    async fn generate_image(&self, request: &ImageRequest) -> Result<String> {
        info!("Generating image for prompt: {:.100}", request.prompt);

        let body = FluxRequest {
            prompt: &request.prompt,
            image_size: &request.image_size,
            num_inference_steps: request.num_inference_steps.unwrap_or(self.default_steps),
            num_images: 1,
            enable_safety_checker: true,
            seed: request.seed,
            guidance_scale: request.guidance_scale,
            negative_prompt: request.negative_prompt.as_deref().filter(|p| !p.is_empty()),
        };

        let mut request_builder = self.client.post(&self.api_url).json(&body);
        if let Some(api_key) = &self.api_key {
            request_builder = request_builder.header("Authorization", format!("Key {}", api_key));
        }

        let response = request_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Generator(format!(
                "Image API returned {}: {}",
                status, error_text
            )));
        }

        let result: FluxResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generator(format!("Unexpected image API response: {}", e)))?;

        match result.images.into_iter().next() {
            Some(image) => {
                info!(
                    "Generated image: {} ({}x{})",
                    image.url,
                    image.width.unwrap_or_default(),
                    image.height.unwrap_or_default()
                );
                Ok(image.url)
            }
            None => {
                error!("No images returned from the image API");
                Err(AppError::Generator("Image API returned no images".into()))
            }
        }
    }
}
