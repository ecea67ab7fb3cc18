use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::GenerateError;
use crate::generation::poller::{self, PollOutcome, DEFAULT_POLL_INTERVAL};
use crate::generation::{MediaBackend, VideoModel, VideoRequest};
use crate::scene::{Scene, SceneStatus};
use crate::workspace::Workspace;

/// Everything the background job tells the host. The host reacts by feeding
/// each notification into [`crate::scene::SceneStore::apply`]; it never
/// mutates scene state on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobNotification {
    /// A batch is about to start this scene (1-based position within batch).
    Progress {
        scene_id: usize,
        position: usize,
        total: usize,
        header: String,
    },
    ImageGenerating {
        scene_id: usize,
    },
    VideoGenerating {
        scene_id: usize,
    },
    Completed {
        scene_id: usize,
        image_path: PathBuf,
        video_path: PathBuf,
    },
    Error {
        scene_id: usize,
        message: String,
        needs_credentials: bool,
    },
    /// Inter-scene rate-limit delay, once per second.
    Countdown {
        seconds_remaining: u64,
    },
    /// The cancel flag was observed; no further work will start.
    Stopped,
    /// A non-aborted batch finished every scene (errored scenes included).
    AllComplete,
}

/// Cooperative cancellation flag, checked at every suspension point.
/// Observing it stops new work; in-flight remote calls are abandoned.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-attempt generation settings, fixed for the lifetime of one job.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobSettings {
    pub video_model: VideoModel,
    pub lip_sync: bool,
}

/// A running background job: the notification stream plus its cancel token.
///
/// Dropping the handle abandons the job without stopping it; call
/// [`JobHandle::stop`] first for a clean shutdown.
pub struct JobHandle {
    notifications: mpsc::Receiver<JobNotification>,
    cancel: CancelToken,
}

impl JobHandle {
    /// Request cooperative cancellation.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// The host's single-consumer receive loop. Returns `None` once the job
    /// has finished and the channel drained.
    pub async fn recv(&mut self) -> Option<JobNotification> {
        self.notifications.recv().await
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}

/// Drives scene generation in a background task, one scene at a time.
///
/// The task shares no mutable state with the host; everything flows through
/// the notification channel. Strictly sequential by design: the external
/// services rate-limit aggressively, so there is never more than one scene
/// in flight per job.
pub struct Orchestrator {
    backend: Arc<dyn MediaBackend>,
    workspace: Workspace,
    poll_interval: Duration,
}

/// Room for a full batch worth of countdown ticks without backpressure.
const NOTIFICATION_BUFFER: usize = 256;

impl Orchestrator {
    pub fn new(backend: Arc<dyn MediaBackend>, workspace: Workspace) -> Self {
        Self {
            backend,
            workspace,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Single generation attempt for one scene.
    ///
    /// Not queued and not gated on any batch's abort flag; racing a running
    /// batch on the same scene id is the caller's responsibility to avoid.
    pub fn start_one(&self, scene: Scene, settings: JobSettings) -> JobHandle {
        let (tx, rx) = mpsc::channel(NOTIFICATION_BUFFER);
        let cancel = CancelToken::new();
        let backend = Arc::clone(&self.backend);
        let workspace = self.workspace.clone();
        let poll_interval = self.poll_interval;
        let task_cancel = cancel.clone();

        tokio::spawn(async move {
            info!("Starting single-scene job for scene {}", scene.id);
            let outcome = run_attempt(
                backend.as_ref(),
                &workspace,
                &scene,
                settings,
                poll_interval,
                &task_cancel,
                &tx,
            )
            .await;
            if outcome == AttemptOutcome::Aborted {
                let _ = tx.send(JobNotification::Stopped).await;
            }
        });

        JobHandle {
            notifications: rx,
            cancel,
        }
    }

    /// Generate every not-yet-completed scene, strictly sequentially in list
    /// order, waiting `delay_minutes` between scenes to respect third-party
    /// rate limits.
    pub fn start_all(
        &self,
        scenes: Vec<Scene>,
        settings: JobSettings,
        delay_minutes: u64,
    ) -> JobHandle {
        let (tx, rx) = mpsc::channel(NOTIFICATION_BUFFER);
        let cancel = CancelToken::new();
        let backend = Arc::clone(&self.backend);
        let workspace = self.workspace.clone();
        let poll_interval = self.poll_interval;
        let task_cancel = cancel.clone();

        tokio::spawn(async move {
            run_batch(
                backend.as_ref(),
                &workspace,
                scenes,
                settings,
                delay_minutes,
                poll_interval,
                &task_cancel,
                &tx,
            )
            .await;
        });

        JobHandle {
            notifications: rx,
            cancel,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum AttemptOutcome {
    /// The scene reached a terminal state, completed or error.
    Finished,
    /// The cancel flag was observed mid-attempt.
    Aborted,
}

#[allow(clippy::too_many_arguments)]
async fn run_batch(
    backend: &dyn MediaBackend,
    workspace: &Workspace,
    scenes: Vec<Scene>,
    settings: JobSettings,
    delay_minutes: u64,
    poll_interval: Duration,
    cancel: &CancelToken,
    tx: &mpsc::Sender<JobNotification>,
) {
    let pending: Vec<Scene> = scenes
        .into_iter()
        .filter(|s| s.status != SceneStatus::Completed)
        .collect();
    let total = pending.len();
    info!("Starting batch of {} scenes", total);

    for (index, scene) in pending.iter().enumerate() {
        if cancel.is_cancelled() {
            info!("Batch stopped before scene {}", scene.id);
            let _ = tx.send(JobNotification::Stopped).await;
            return;
        }

        let _ = tx
            .send(JobNotification::Progress {
                scene_id: scene.id,
                position: index + 1,
                total,
                header: scene.header.clone(),
            })
            .await;

        let outcome = run_attempt(
            backend,
            workspace,
            scene,
            settings,
            poll_interval,
            cancel,
            tx,
        )
        .await;
        if outcome == AttemptOutcome::Aborted {
            let _ = tx.send(JobNotification::Stopped).await;
            return;
        }

        let is_last = index + 1 == total;
        if !is_last && !countdown_delay(delay_minutes, cancel, tx).await {
            let _ = tx.send(JobNotification::Stopped).await;
            return;
        }
    }

    info!("Batch complete ({} scenes)", total);
    let _ = tx.send(JobNotification::AllComplete).await;
}

/// One generation attempt: image, then video via the poller. Failures are
/// recorded on this scene only and end the attempt, never the batch.
async fn run_attempt(
    backend: &dyn MediaBackend,
    workspace: &Workspace,
    scene: &Scene,
    settings: JobSettings,
    poll_interval: Duration,
    cancel: &CancelToken,
    tx: &mpsc::Sender<JobNotification>,
) -> AttemptOutcome {
    let scene_id = scene.id;

    // Image stage
    let _ = tx.send(JobNotification::ImageGenerating { scene_id }).await;

    let image_prompt = effective_prompt(&scene.image_prompt, &scene.content, &scene.header);
    let image = match backend.generate_image(image_prompt).await {
        Ok(bytes) => bytes,
        Err(e) => {
            send_error(tx, scene_id, &e).await;
            return AttemptOutcome::Finished;
        }
    };

    let image_path = workspace.image_path(scene_id);
    if let Err(e) = tokio::fs::write(&image_path, &image).await {
        send_error(tx, scene_id, &GenerateError::Io(e)).await;
        return AttemptOutcome::Finished;
    }

    // Video stage
    if cancel.is_cancelled() {
        return AttemptOutcome::Aborted;
    }
    let _ = tx.send(JobNotification::VideoGenerating { scene_id }).await;

    let animation_prompt = effective_prompt(&scene.animation_prompt, &scene.image_prompt, &scene.content);
    let request = VideoRequest {
        prompt: animation_prompt.to_string(),
        image_png: image,
        model: settings.video_model,
        lip_sync: settings.lip_sync,
    };

    let handle = match backend.start_video(&request).await {
        Ok(handle) => handle,
        Err(e) => {
            send_error(tx, scene_id, &e).await;
            return AttemptOutcome::Finished;
        }
    };

    let video =
        match poller::poll_to_completion(backend, &handle, poll_interval, cancel).await {
            Ok(PollOutcome::Completed(bytes)) => bytes,
            Ok(PollOutcome::Cancelled) => return AttemptOutcome::Aborted,
            Err(e) => {
                send_error(tx, scene_id, &e).await;
                return AttemptOutcome::Finished;
            }
        };

    let video_path = workspace.video_path(scene_id);
    if let Err(e) = tokio::fs::write(&video_path, &video).await {
        send_error(tx, scene_id, &GenerateError::Io(e)).await;
        return AttemptOutcome::Finished;
    }

    info!("Scene {} completed", scene_id);
    let _ = tx
        .send(JobNotification::Completed {
            scene_id,
            image_path,
            video_path,
        })
        .await;
    AttemptOutcome::Finished
}

/// A scene that matched no prompt candidate carries empty prompts; fall back
/// to its lyric text rather than sending an empty prompt the services reject.
fn effective_prompt<'a>(primary: &'a str, fallback: &'a str, last_resort: &'a str) -> &'a str {
    if !primary.trim().is_empty() {
        primary
    } else if !fallback.trim().is_empty() {
        fallback
    } else {
        last_resort
    }
}

async fn send_error(tx: &mpsc::Sender<JobNotification>, scene_id: usize, error: &GenerateError) {
    warn!("Scene {} failed: {}", scene_id, error);
    let _ = tx
        .send(JobNotification::Error {
            scene_id,
            message: error.user_message(),
            needs_credentials: error.needs_credentials(),
        })
        .await;
}

/// Interruptible inter-scene wait with a once-per-second countdown.
/// Returns false when the cancel flag was observed.
async fn countdown_delay(
    delay_minutes: u64,
    cancel: &CancelToken,
    tx: &mpsc::Sender<JobNotification>,
) -> bool {
    let total_seconds = delay_minutes * 60;
    for remaining in (1..=total_seconds).rev() {
        if cancel.is_cancelled() {
            return false;
        }
        let _ = tx
            .send(JobNotification::Countdown {
                seconds_remaining: remaining,
            })
            .await;
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    !cancel.is_cancelled()
}
