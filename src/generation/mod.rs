mod anthropic;
mod dashscope;
mod openai;
pub mod poller;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use anthropic::{generate_scene_prompts, generate_song, Song};

/// API keys for the external generation services, passed explicitly into
/// every client. The library never reads ambient process state.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub anthropic_api_key: String,
    pub openai_api_key: String,
    pub dashscope_api_key: String,
}

/// Video model variant offered by the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoModel {
    /// Faster, cheaper drafts.
    #[default]
    Turbo,
    /// Higher fidelity, slower.
    Plus,
}

impl VideoModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoModel::Turbo => "wan2.2-i2v-turbo",
            VideoModel::Plus => "wan2.2-i2v-plus",
        }
    }
}

/// One image-to-video request: the animation prompt plus the still frame the
/// clip starts from.
#[derive(Debug, Clone)]
pub struct VideoRequest {
    pub prompt: String,
    pub image_png: Vec<u8>,
    pub model: VideoModel,
    pub lip_sync: bool,
}

/// Opaque reference to a long-running remote video operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    pub task_id: String,
}

/// Snapshot of a remote operation, as reported by one status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Running,
    Succeeded { video_url: String },
    Failed { message: String },
}

/// The media services the orchestrator drives. One scene attempt uses
/// `generate_image`, then `start_video` plus `poll_video`/`fetch_artifact`
/// through the poller. Implemented by [`MediaClient`] in production and by
/// scripted fakes in tests.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// One still-image payload for a prompt, or failure.
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>>;

    /// Kick off a video generation operation; returns immediately.
    async fn start_video(&self, request: &VideoRequest) -> Result<OperationHandle>;

    /// One status query for a running operation.
    async fn poll_video(&self, handle: &OperationHandle) -> Result<OperationStatus>;

    /// Download the finished artifact named by a result locator.
    async fn fetch_artifact(&self, url: &str) -> Result<Vec<u8>>;
}

/// Production [`MediaBackend`]: OpenAI for stills, DashScope for video.
#[derive(Debug, Clone)]
pub struct MediaClient {
    http: reqwest::Client,
    credentials: Credentials,
}

impl MediaClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .timeout(std::time::Duration::from_secs(300))
            .build()?;
        Ok(Self { http, credentials })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

#[async_trait]
impl MediaBackend for MediaClient {
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>> {
        openai::generate_image(&self.http, &self.credentials.openai_api_key, prompt).await
    }

    async fn start_video(&self, request: &VideoRequest) -> Result<OperationHandle> {
        dashscope::start_video(&self.http, &self.credentials.dashscope_api_key, request).await
    }

    async fn poll_video(&self, handle: &OperationHandle) -> Result<OperationStatus> {
        dashscope::query_task(&self.http, &self.credentials.dashscope_api_key, handle).await
    }

    async fn fetch_artifact(&self, url: &str) -> Result<Vec<u8>> {
        dashscope::download_artifact(&self.http, url).await
    }
}
