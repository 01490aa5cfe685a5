//! Capture path: grab a frame, submit it for attendance marking.
//!
//! Submissions are single-flight (a busy flag suppresses overlapping
//! triggers) and can run on a recurring timer (auto mode). Disabling
//! auto mode or dropping the controller only stops scheduling: the
//! interval task is told to stop between cycles, so an already-sent
//! request always runs to completion and the busy flag always resets.

use crate::session::{Severity, SharedSession};
use async_trait::async_trait;
use presence_api::{AttendanceService, ImageBlob, Operation};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Source of webcam frames. Returning `None` means the camera is not
/// ready (not initialized, warming up, covered); the cycle is skipped
/// silently.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture_jpeg(&self) -> Option<ImageBlob>;
}

/// Capture timing knobs, configurable rather than hardcoded.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// Delay between auto-mode capture cycles.
    pub interval: Duration,
    /// How long a success notice and the recognition highlight stay
    /// visible before the one-shot timer clears them.
    pub notice_ttl: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            notice_ttl: Duration::from_secs(3),
        }
    }
}

/// Result of one capture trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Submission completed; attendance was marked server-side.
    Marked {
        recognized: Vec<String>,
        newly_added: Vec<String>,
    },
    /// A submission was already in flight; no request was sent.
    SkippedBusy,
    /// The camera had no usable frame; no request was sent.
    SkippedNoFrame,
    /// The submission failed; carries the user-facing message.
    Failed(&'static str),
}

/// Owned handle of the recurring capture task. Dropping it signals the
/// task to stop, so auto mode can never leak a dangling timer. The
/// task only observes the signal between cycles: a capture already in
/// flight runs to completion and releases the busy flag normally.
pub struct AutoCycle {
    stop: watch::Sender<bool>,
}

impl Drop for AutoCycle {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
    }
}

/// Releases the single-flight flag on every exit path, including
/// panics and cancellation, so the guard can never stay wedged.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct Inner {
    service: Arc<dyn AttendanceService>,
    frames: Arc<dyn FrameSource>,
    session: SharedSession,
    settings: CaptureSettings,
    busy: AtomicBool,
    auto: Mutex<Option<AutoCycle>>,
    expiry: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Ok(mut expiry) = self.expiry.lock() {
            if let Some(handle) = expiry.take() {
                handle.abort();
            }
        }
    }
}

/// Controller for the webcam capture path. Cheap to clone; clones
/// share the busy flag, the session, and the auto-cycle handle.
#[derive(Clone)]
pub struct CaptureController {
    inner: Arc<Inner>,
}

impl CaptureController {
    pub fn new(
        service: Arc<dyn AttendanceService>,
        frames: Arc<dyn FrameSource>,
        session: SharedSession,
        settings: CaptureSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                service,
                frames,
                session,
                settings,
                busy: AtomicBool::new(false),
                auto: Mutex::new(None),
                expiry: Mutex::new(None),
            }),
        }
    }

    pub fn session(&self) -> SharedSession {
        self.inner.session.clone()
    }

    /// Trigger one capture-and-mark cycle.
    ///
    /// Single-flight: while a cycle from this controller is in flight,
    /// further triggers return [`CaptureOutcome::SkippedBusy`] without
    /// issuing a request. This keeps a fast timer from outrunning
    /// network latency.
    pub async fn capture_once(&self) -> CaptureOutcome {
        if self.inner.busy.swap(true, Ordering::SeqCst) {
            tracing::debug!("capture already in flight; trigger suppressed");
            return CaptureOutcome::SkippedBusy;
        }
        let _busy = BusyGuard(&self.inner.busy);
        self.run_cycle().await
    }

    async fn run_cycle(&self) -> CaptureOutcome {
        let Some(blob) = self.inner.frames.capture_jpeg().await else {
            tracing::debug!("no frame available; cycle skipped");
            return CaptureOutcome::SkippedNoFrame;
        };

        self.inner.session.lock().unwrap().begin_request();

        match self.inner.service.mark_attendance(&blob).await {
            Ok(outcome) => {
                if outcome.has_new_identities() {
                    // One snapshot refresh per response that added identities.
                    match self.inner.service.report().await {
                        Ok(report) => self.inner.session.lock().unwrap().set_report(report),
                        Err(e) => tracing::warn!(error = %e, "report refresh failed"),
                    }

                    let text = format!("Reconnu: {}", outcome.recognized.join(", "));
                    let seq = {
                        let mut session = self.inner.session.lock().unwrap();
                        session.set_recognition(outcome.recognized.clone(), text)
                    };
                    self.schedule_expiry(seq);
                }

                self.inner.session.lock().unwrap().end_request();
                tracing::info!(
                    recognized = outcome.recognized.len(),
                    newly_added = outcome.newly_added.len(),
                    "capture cycle completed"
                );
                CaptureOutcome::Marked {
                    recognized: outcome.recognized,
                    newly_added: outcome.newly_added,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "capture submission failed");
                let msg = Operation::Mark.user_message();
                let mut session = self.inner.session.lock().unwrap();
                session.set_notice(Severity::Error, msg);
                session.end_request();
                CaptureOutcome::Failed(msg)
            }
        }
    }

    /// Arm the one-shot notice-expiry timer, replacing (and aborting)
    /// any previous one.
    fn schedule_expiry(&self, seq: u64) {
        let session = self.inner.session.clone();
        let ttl = self.inner.settings.notice_ttl;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            session.lock().unwrap().expire(seq);
        });
        if let Some(prev) = self.inner.expiry.lock().unwrap().replace(handle) {
            prev.abort();
        }
    }

    /// Manual → Auto: start the recurring capture task. No-op if auto
    /// mode is already on. The first capture fires after one interval,
    /// not immediately.
    pub fn enable_auto(&self) {
        let mut auto = self.inner.auto.lock().unwrap();
        if auto.is_some() {
            return;
        }

        let interval = self.inner.settings.interval;
        let (stop, mut stopped) = watch::channel(false);
        // The loop holds only a weak reference: dropping the last
        // controller handle ends the cycle instead of keeping it alive.
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            loop {
                // The stop signal is only honored here, between cycles;
                // a capture_once in progress is never torn down.
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = stopped.changed() => break,
                }
                let Some(inner) = weak.upgrade() else { break };
                CaptureController { inner }.capture_once().await;
            }
        });

        *auto = Some(AutoCycle { stop });
        self.inner.session.lock().unwrap().enter_auto();
        tracing::info!(interval_ms = interval.as_millis() as u64, "auto capture enabled");
    }

    /// Auto → Manual: stop scheduling new captures. An in-flight
    /// request is not cancelled.
    pub fn disable_auto(&self) {
        let stopped = self.inner.auto.lock().unwrap().take();
        if stopped.is_some() {
            self.inner.session.lock().unwrap().leave_auto();
            tracing::info!("auto capture disabled");
        }
    }

    pub fn auto_enabled(&self) -> bool {
        self.inner.auto.lock().unwrap().is_some()
    }
}
