use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{GenerateError, Result};
use crate::generation::{OperationHandle, OperationStatus, VideoRequest};

const VIDEO_SYNTHESIS_API: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/video-generation/video-synthesis";
const TASKS_API: &str = "https://dashscope.aliyuncs.com/api/v1/tasks";

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    output: SubmitOutput,
}

#[derive(Debug, Deserialize)]
struct SubmitOutput {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct TaskResponse {
    output: TaskOutput,
}

#[derive(Debug, Deserialize)]
struct TaskOutput {
    task_status: String,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Submit an image-to-video operation. Returns the handle to poll;
/// the operation keeps running remotely after this call returns.
pub async fn start_video(
    http: &reqwest::Client,
    api_key: &str,
    request: &VideoRequest,
) -> Result<OperationHandle> {
    let image_b64 = base64::engine::general_purpose::STANDARD.encode(&request.image_png);

    let request_body = json!({
        "model": request.model.as_str(),
        "input": {
            "prompt": request.prompt,
            "img_base64": image_b64,
        },
        "parameters": {
            "lip_sync": request.lip_sync,
        }
    });

    info!(
        "Submitting video task (model: {}, lip_sync: {})",
        request.model.as_str(),
        request.lip_sync
    );

    let response = http
        .post(VIDEO_SYNTHESIS_API)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .header("X-DashScope-Async", "enable")
        .json(&request_body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GenerateError::from_status(status, body));
    }

    let submitted: SubmitResponse = response
        .json()
        .await
        .map_err(|e| GenerateError::Malformed(format!("video submit response: {}", e)))?;

    info!("Video task submitted (id: {})", submitted.output.task_id);
    Ok(OperationHandle {
        task_id: submitted.output.task_id,
    })
}

/// One status query for a running operation.
pub async fn query_task(
    http: &reqwest::Client,
    api_key: &str,
    handle: &OperationHandle,
) -> Result<OperationStatus> {
    let response = http
        .get(format!("{}/{}", TASKS_API, handle.task_id))
        .header("Authorization", format!("Bearer {}", api_key))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GenerateError::from_status(status, body));
    }

    let task: TaskResponse = response
        .json()
        .await
        .map_err(|e| GenerateError::Malformed(format!("video task response: {}", e)))?;

    match task.output.task_status.as_str() {
        "SUCCEEDED" => {
            let video_url = task.output.video_url.ok_or_else(|| {
                GenerateError::Malformed("completed video task has no result URL".to_string())
            })?;
            Ok(OperationStatus::Succeeded { video_url })
        }
        "FAILED" | "CANCELED" => Ok(OperationStatus::Failed {
            message: task
                .output
                .message
                .unwrap_or_else(|| "video generation failed".to_string()),
        }),
        other => {
            debug!("Video task {} still {}", handle.task_id, other);
            Ok(OperationStatus::Running)
        }
    }
}

/// Download the finished clip from its result locator.
pub async fn download_artifact(http: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = http.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(GenerateError::Generation(format!(
            "artifact download failed (HTTP {})",
            status
        )));
    }

    let bytes = response.bytes().await?;
    info!("Video artifact downloaded ({} bytes)", bytes.len());
    Ok(bytes.to_vec())
}
