//! Songreel turns a theme into an AI-generated music video, scene by scene.
//!
//! Lyrics are segmented into sections ([`lyrics`]), reconciled with
//! AI-authored visual prompts ([`matcher`]), and rendered by a sequential,
//! cancellable background job ([`orchestrator`]) that chains image and video
//! generation per scene. The host drives everything through
//! [`orchestrator::JobHandle`] and reacts to its notification stream via
//! [`scene::SceneStore::apply`].

pub mod error;
pub mod generation;
pub mod lyrics;
pub mod matcher;
pub mod orchestrator;
pub mod scene;
pub mod workspace;

pub use error::{GenerateError, Result};
pub use generation::{
    generate_scene_prompts, generate_song, Credentials, MediaBackend, MediaClient, Song,
    VideoModel,
};
pub use lyrics::{segment_lyrics, Section};
pub use matcher::{match_sections, PromptCandidate};
pub use orchestrator::{
    CancelToken, JobHandle, JobNotification, JobSettings, Orchestrator,
};
pub use scene::{Scene, SceneStatus, SceneStore, SceneUpdate};
pub use workspace::Workspace;
