use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Per-session directory holding generated scene artifacts.
///
/// Artifact references handed out by the pipeline are paths inside this
/// directory; `reset` deletes the tree, revoking them all. Nothing here is
/// persisted across sessions.
#[derive(Debug, Clone)]
pub struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    /// Open a workspace at an explicit directory, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Fresh workspace under the system temp directory.
    pub fn session() -> std::io::Result<Self> {
        Self::new(std::env::temp_dir().join(format!("songreel_{}", Uuid::new_v4())))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn image_path(&self, scene_id: usize) -> PathBuf {
        self.dir.join(format!("scene_{}.png", scene_id))
    }

    pub fn video_path(&self, scene_id: usize) -> PathBuf {
        self.dir.join(format!("scene_{}.mp4", scene_id))
    }

    /// Delete every artifact and recreate the empty directory.
    pub fn reset(&self) -> std::io::Result<()> {
        let _ = std::fs::remove_dir_all(&self.dir);
        std::fs::create_dir_all(&self.dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_per_scene() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = Workspace::new(tmp.path().join("session")).unwrap();
        assert!(ws.dir().is_dir());
        assert_ne!(ws.image_path(0), ws.image_path(1));
        assert!(ws.video_path(3).ends_with("scene_3.mp4"));
    }

    #[test]
    fn reset_revokes_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = Workspace::new(tmp.path().join("session")).unwrap();
        std::fs::write(ws.image_path(0), b"png").unwrap();
        assert!(ws.image_path(0).exists());

        ws.reset().unwrap();
        assert!(ws.dir().is_dir());
        assert!(!ws.image_path(0).exists());
    }
}
