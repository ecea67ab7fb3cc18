use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::orchestrator::JobNotification;

/// Generation lifecycle of one scene.
///
/// Transitions are monotonic within one attempt
/// (idle -> image_generating -> video_generating -> completed | error);
/// a scene returns to idle only through an explicit retry or
/// cancellation-triggered cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SceneStatus {
    #[default]
    Idle,
    ImageGenerating,
    VideoGenerating,
    Completed,
    Error,
}

impl SceneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneStatus::Idle => "idle",
            SceneStatus::ImageGenerating => "image_generating",
            SceneStatus::VideoGenerating => "video_generating",
            SceneStatus::Completed => "completed",
            SceneStatus::Error => "error",
        }
    }

    /// Terminal states receive no further updates within an attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SceneStatus::Completed | SceneStatus::Error)
    }

    /// True while a remote call for this scene may still be outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SceneStatus::ImageGenerating | SceneStatus::VideoGenerating)
    }
}

impl std::fmt::Display for SceneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A production unit derived one-to-one from a lyric section.
///
/// `id` equals the section's position in the original lyric order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: usize,
    pub header: String,
    pub content: String,
    pub image_prompt: String,
    pub animation_prompt: String,
    pub status: SceneStatus,
    pub error_message: Option<String>,
    pub image_path: Option<PathBuf>,
    pub video_path: Option<PathBuf>,
}

impl Scene {
    pub fn new(
        id: usize,
        header: impl Into<String>,
        content: impl Into<String>,
        image_prompt: impl Into<String>,
        animation_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id,
            header: header.into(),
            content: content.into(),
            image_prompt: image_prompt.into(),
            animation_prompt: animation_prompt.into(),
            status: SceneStatus::Idle,
            error_message: None,
            image_path: None,
            video_path: None,
        }
    }
}

/// Field subset for a partial scene update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct SceneUpdate {
    pub status: Option<SceneStatus>,
    pub error_message: Option<String>,
    pub image_path: Option<PathBuf>,
    pub video_path: Option<PathBuf>,
}

/// Ordered collection of scenes; the sole source of truth for rendering.
///
/// Entries are never reordered and ids stay stable across updates. All
/// generation-driven mutation goes through [`SceneStore::apply`], fed by the
/// orchestrator's notification stream.
#[derive(Debug, Default)]
pub struct SceneStore {
    scenes: Vec<Scene>,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection after a fresh matching pass.
    pub fn replace_all(&mut self, scenes: Vec<Scene>) {
        self.scenes = scenes;
    }

    /// Merge a field subset into the scene with this id.
    /// Returns false when no such scene exists.
    pub fn update(&mut self, id: usize, update: SceneUpdate) -> bool {
        let Some(scene) = self.scenes.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        if let Some(status) = update.status {
            scene.status = status;
        }
        if let Some(message) = update.error_message {
            scene.error_message = Some(message);
        }
        if let Some(path) = update.image_path {
            scene.image_path = Some(path);
        }
        if let Some(path) = update.video_path {
            scene.video_path = Some(path);
        }
        true
    }

    pub fn get(&self, id: usize) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Read-only copy for rendering or for handing to `start_all`.
    pub fn snapshot(&self) -> Vec<Scene> {
        self.scenes.clone()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Discard all scenes (pipeline reset).
    pub fn reset(&mut self) {
        self.scenes.clear();
    }

    /// Return any scene left mid-generation to idle. Used after a stop:
    /// the abandoned remote call's late response is no longer listened for.
    pub fn reset_in_flight(&mut self) {
        for scene in &mut self.scenes {
            if scene.status.is_in_flight() {
                scene.status = SceneStatus::Idle;
                scene.error_message = None;
            }
        }
    }

    /// React to one orchestrator notification. This is the only way
    /// generation progress reaches the store.
    pub fn apply(&mut self, notification: &JobNotification) {
        match notification {
            JobNotification::ImageGenerating { scene_id } => {
                // A retry overwrites the previous attempt's error and artifacts.
                if let Some(scene) = self.scenes.iter_mut().find(|s| s.id == *scene_id) {
                    scene.status = SceneStatus::ImageGenerating;
                    scene.error_message = None;
                    scene.image_path = None;
                    scene.video_path = None;
                }
            }
            JobNotification::VideoGenerating { scene_id } => {
                self.update(
                    *scene_id,
                    SceneUpdate {
                        status: Some(SceneStatus::VideoGenerating),
                        ..Default::default()
                    },
                );
            }
            JobNotification::Completed {
                scene_id,
                image_path,
                video_path,
            } => {
                self.update(
                    *scene_id,
                    SceneUpdate {
                        status: Some(SceneStatus::Completed),
                        image_path: Some(image_path.clone()),
                        video_path: Some(video_path.clone()),
                        ..Default::default()
                    },
                );
            }
            JobNotification::Error {
                scene_id, message, ..
            } => {
                self.update(
                    *scene_id,
                    SceneUpdate {
                        status: Some(SceneStatus::Error),
                        error_message: Some(message.clone()),
                        ..Default::default()
                    },
                );
            }
            JobNotification::Stopped => self.reset_in_flight(),
            JobNotification::Progress { .. }
            | JobNotification::Countdown { .. }
            | JobNotification::AllComplete => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(ids: &[usize]) -> SceneStore {
        let mut store = SceneStore::new();
        store.replace_all(
            ids.iter()
                .map(|&i| Scene::new(i, format!("Verse {}", i), "words", "a picture", "a motion"))
                .collect(),
        );
        store
    }

    #[test]
    fn new_scene_is_idle() {
        let scene = Scene::new(0, "Chorus", "la la", "", "");
        assert_eq!(scene.status, SceneStatus::Idle);
        assert!(scene.error_message.is_none());
        assert!(scene.image_path.is_none());
    }

    #[test]
    fn partial_update_leaves_other_fields() {
        let mut store = store_with(&[0, 1]);
        assert!(store.update(
            1,
            SceneUpdate {
                status: Some(SceneStatus::ImageGenerating),
                ..Default::default()
            }
        ));
        let scene = store.get(1).unwrap();
        assert_eq!(scene.status, SceneStatus::ImageGenerating);
        assert_eq!(scene.image_prompt, "a picture");
        assert!(scene.error_message.is_none());
    }

    #[test]
    fn update_unknown_id_is_rejected() {
        let mut store = store_with(&[0]);
        assert!(!store.update(7, SceneUpdate::default()));
    }

    #[test]
    fn updates_never_reorder() {
        let mut store = store_with(&[0, 1, 2]);
        store.update(
            2,
            SceneUpdate {
                status: Some(SceneStatus::Completed),
                ..Default::default()
            },
        );
        let ids: Vec<usize> = store.scenes().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn apply_error_records_message() {
        let mut store = store_with(&[0]);
        store.apply(&JobNotification::Error {
            scene_id: 0,
            message: "quota exhausted".into(),
            needs_credentials: false,
        });
        let scene = store.get(0).unwrap();
        assert_eq!(scene.status, SceneStatus::Error);
        assert_eq!(scene.error_message.as_deref(), Some("quota exhausted"));
    }

    #[test]
    fn apply_stopped_resets_in_flight_scenes() {
        let mut store = store_with(&[0, 1, 2]);
        store.update(
            0,
            SceneUpdate {
                status: Some(SceneStatus::Completed),
                ..Default::default()
            },
        );
        store.update(
            1,
            SceneUpdate {
                status: Some(SceneStatus::VideoGenerating),
                ..Default::default()
            },
        );
        store.apply(&JobNotification::Stopped);
        assert_eq!(store.get(0).unwrap().status, SceneStatus::Completed);
        assert_eq!(store.get(1).unwrap().status, SceneStatus::Idle);
        assert_eq!(store.get(2).unwrap().status, SceneStatus::Idle);
    }

    #[test]
    fn retry_clears_previous_error_and_artifacts() {
        let mut store = store_with(&[0]);
        store.update(
            0,
            SceneUpdate {
                status: Some(SceneStatus::Error),
                error_message: Some("video generation failed".into()),
                image_path: Some(PathBuf::from("/tmp/old.png")),
                ..Default::default()
            },
        );
        store.apply(&JobNotification::ImageGenerating { scene_id: 0 });
        let scene = store.get(0).unwrap();
        assert_eq!(scene.status, SceneStatus::ImageGenerating);
        assert!(scene.error_message.is_none());
        assert!(scene.image_path.is_none());
        assert!(scene.video_path.is_none());
    }
}
