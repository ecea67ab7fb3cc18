use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::{GenerateError, Result};

const IMAGES_API_URL: &str = "https://api.openai.com/v1/images/generations";
const IMAGE_MODEL: &str = "gpt-image-1";
/// Landscape frame matching the video service's output aspect.
const IMAGE_SIZE: &str = "1536x1024";

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<ImagePayload>,
}

#[derive(Debug, Deserialize)]
struct ImagePayload {
    b64_json: Option<String>,
}

/// Generate one still image for a prompt and return the decoded PNG bytes.
pub async fn generate_image(
    http: &reqwest::Client,
    api_key: &str,
    prompt: &str,
) -> Result<Vec<u8>> {
    info!("Requesting image ({} chars of prompt)", prompt.len());

    let request_body = json!({
        "model": IMAGE_MODEL,
        "prompt": prompt,
        "n": 1,
        "size": IMAGE_SIZE,
    });

    let response = http
        .post(IMAGES_API_URL)
        .header("Authorization", format!("Bearer {}", api_key))
        .json(&request_body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GenerateError::from_status(status, body));
    }

    let api_response: ImagesResponse = response
        .json()
        .await
        .map_err(|e| GenerateError::Malformed(format!("images response body: {}", e)))?;

    let encoded = api_response
        .data
        .first()
        .and_then(|p| p.b64_json.as_deref())
        .ok_or_else(|| GenerateError::Malformed("no image payload in response".to_string()))?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| GenerateError::Malformed(format!("image payload base64: {}", e)))?;

    info!("Image received ({} bytes)", bytes.len());
    Ok(bytes)
}
