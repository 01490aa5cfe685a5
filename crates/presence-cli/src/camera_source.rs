//! Bridges the V4L2 camera into the capture controller's frame seam.

use async_trait::async_trait;
use presence_api::ImageBlob;
use presence_core::FrameSource;
use presence_hw::{Camera, CameraError};
use std::sync::{Arc, Mutex};

struct Inner {
    device_path: String,
    /// Opened lazily on the first cycle; dropped and reopened after a
    /// capture failure (device unplugged, driver hiccup).
    camera: Mutex<Option<Camera>>,
}

/// [`FrameSource`] backed by a V4L2 webcam. Capture runs on the
/// blocking pool; an unavailable camera means a silently skipped
/// cycle, never an error surfaced to the user.
#[derive(Clone)]
pub struct CameraSource {
    inner: Arc<Inner>,
}

impl CameraSource {
    pub fn new(device_path: String) -> Self {
        Self {
            inner: Arc::new(Inner {
                device_path,
                camera: Mutex::new(None),
            }),
        }
    }
}

#[async_trait]
impl FrameSource for CameraSource {
    async fn capture_jpeg(&self) -> Option<ImageBlob> {
        let inner = self.inner.clone();
        let result = tokio::task::spawn_blocking(move || {
            let mut camera = match inner.camera.lock() {
                Ok(guard) => guard,
                Err(_) => return None,
            };

            if camera.is_none() {
                match Camera::open(&inner.device_path) {
                    Ok(cam) => *camera = Some(cam),
                    Err(e) => {
                        tracing::debug!(
                            device = %inner.device_path,
                            error = %e,
                            "camera unavailable; cycle skipped"
                        );
                        return None;
                    }
                }
            }

            let Some(cam) = camera.as_ref() else {
                return None;
            };

            match cam.capture_jpeg() {
                Ok(bytes) => Some(bytes),
                Err(CameraError::FrameNotReady) => {
                    tracing::debug!("frame not ready; cycle skipped");
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, "capture failed; will reopen device");
                    *camera = None;
                    None
                }
            }
        })
        .await;

        match result {
            Ok(Some(bytes)) => Some(ImageBlob::jpeg(bytes)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "capture task failed");
                None
            }
        }
    }
}
