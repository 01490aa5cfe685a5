//! Upload path: run recognition actions against a user-chosen file.
//!
//! Unlike the capture path there is no single-flight guard: a second
//! action while one is pending simply issues a second concurrent
//! request, and the last response to resolve wins.

use crate::session::{Notice, Severity};
use presence_api::{
    AttendanceReport, AttendanceService, ImageBlob, Operation, RecognitionResult,
};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct UploadState {
    selection: Option<ImageBlob>,
    results: Vec<RecognitionResult>,
    notice: Option<Notice>,
    report: Option<AttendanceReport>,
}

/// Controller for file-based recognition actions.
pub struct UploadController {
    service: Arc<dyn AttendanceService>,
    state: Mutex<UploadState>,
}

impl UploadController {
    pub fn new(service: Arc<dyn AttendanceService>) -> Self {
        Self {
            service,
            state: Mutex::new(UploadState::default()),
        }
    }

    /// Select an image blob to act on. Prior recognition results and
    /// any notice are cleared so stale output is never attributed to
    /// the new selection.
    pub fn select(&self, blob: ImageBlob) {
        let mut state = self.state.lock().unwrap();
        state.selection = Some(blob);
        state.results.clear();
        state.notice = None;
    }

    /// Read an image file from disk and select it. The media type is
    /// inferred from the file extension.
    pub async fn select_file(&self, path: &Path) -> std::io::Result<()> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_for_path(path);
        tracing::debug!(file = %filename, %mime, size = bytes.len(), "file selected");
        self.select(ImageBlob::new(bytes, mime, filename));
        Ok(())
    }

    /// Recognize-only: no attendance side effect. No-op (returns
    /// false) when nothing is selected.
    pub async fn recognize(&self) -> bool {
        let Some(blob) = self.selection() else {
            return false;
        };

        match self.service.recognize(&blob).await {
            Ok(results) => {
                tracing::debug!(faces = results.len(), "recognition completed");
                self.state.lock().unwrap().results = results;
            }
            Err(e) => {
                tracing::warn!(error = %e, "recognition failed");
                self.set_error(Operation::Recognize);
            }
        }
        true
    }

    /// Recognize and mark the matched identities present. No-op
    /// (returns false) when nothing is selected.
    pub async fn mark(&self) -> bool {
        let Some(blob) = self.selection() else {
            return false;
        };

        match self.service.mark_attendance(&blob).await {
            Ok(outcome) => {
                let text = format!(
                    "Présence enregistrée pour: {}",
                    outcome.recognized.join(", ")
                );
                self.state.lock().unwrap().notice = Some(Notice {
                    severity: Severity::Success,
                    text,
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "attendance marking failed");
                self.set_error(Operation::Mark);
            }
        }
        true
    }

    /// Fetch the attendance report. Independent of the selection.
    pub async fn fetch_report(&self) {
        match self.service.report().await {
            Ok(report) => {
                self.state.lock().unwrap().report = Some(report);
            }
            Err(e) => {
                tracing::warn!(error = %e, "report fetch failed");
                self.set_error(Operation::Report);
            }
        }
    }

    fn set_error(&self, op: Operation) {
        self.state.lock().unwrap().notice = Some(Notice {
            severity: Severity::Error,
            text: op.user_message().to_string(),
        });
    }

    pub fn selection(&self) -> Option<ImageBlob> {
        self.state.lock().unwrap().selection.clone()
    }

    pub fn results(&self) -> Vec<RecognitionResult> {
        self.state.lock().unwrap().results.clone()
    }

    pub fn notice(&self) -> Option<Notice> {
        self.state.lock().unwrap().notice.clone()
    }

    pub fn report(&self) -> Option<AttendanceReport> {
        self.state.lock().unwrap().report.clone()
    }
}

/// Media type from the file extension; `application/octet-stream` for
/// anything unrecognized (the gateway will refuse it).
fn mime_for_path(path: &Path) -> String {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use presence_api::{
        ApiError, CsvExport, HealthStatus, MarkOutcome, RecognitionStatus, ResetAck,
    };
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct MockService {
        recognize_calls: AtomicUsize,
        mark_calls: AtomicUsize,
        latency: Duration,
        fail: bool,
    }

    impl MockService {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                recognize_calls: AtomicUsize::new(0),
                mark_calls: AtomicUsize::new(0),
                latency: Duration::ZERO,
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                recognize_calls: AtomicUsize::new(0),
                mark_calls: AtomicUsize::new(0),
                latency: Duration::ZERO,
                fail: true,
            })
        }

        fn slow(latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                recognize_calls: AtomicUsize::new(0),
                mark_calls: AtomicUsize::new(0),
                latency,
                fail: false,
            })
        }
    }

    #[async_trait]
    impl AttendanceService for MockService {
        async fn recognize(&self, _: &ImageBlob) -> Result<Vec<RecognitionResult>, ApiError> {
            self.recognize_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::Status(500));
            }
            Ok(vec![RecognitionResult {
                status: RecognitionStatus::Recognized,
                label: Some("Alice".into()),
                confidence: Some(0.93),
            }])
        }

        async fn mark_attendance(&self, _: &ImageBlob) -> Result<MarkOutcome, ApiError> {
            self.mark_calls.fetch_add(1, Ordering::SeqCst);
            if self.latency > Duration::ZERO {
                tokio::time::sleep(self.latency).await;
            }
            if self.fail {
                return Err(ApiError::Status(500));
            }
            Ok(MarkOutcome {
                status: "success".into(),
                recognized: vec!["Alice".into(), "Bob".into()],
                newly_added: vec!["Alice".into()],
            })
        }

        async fn report(&self) -> Result<AttendanceReport, ApiError> {
            if self.fail {
                return Err(ApiError::Status(500));
            }
            Ok(AttendanceReport {
                present: vec!["Alice".into()],
                absent: vec!["Bob".into()],
                count: 1,
                statistics: None,
            })
        }

        async fn reset(&self) -> Result<ResetAck, ApiError> {
            Ok(ResetAck {
                message: "Présences réinitialisées".into(),
                count: 0,
            })
        }

        async fn known_students(&self) -> Result<Vec<String>, ApiError> {
            Ok(Vec::new())
        }

        async fn download_absent_csv(&self) -> Result<CsvExport, ApiError> {
            Ok(CsvExport {
                filename: "absents.csv".into(),
                bytes: Vec::new(),
            })
        }

        async fn health(&self) -> Result<HealthStatus, ApiError> {
            Ok(HealthStatus {
                status: "healthy".into(),
                models_loaded: true,
                known_students_count: 0,
                current_attendance: 0,
            })
        }
    }

    fn jpeg_blob() -> ImageBlob {
        ImageBlob::jpeg(vec![0xFF, 0xD8])
    }

    #[tokio::test]
    async fn selecting_new_file_clears_results_and_notice() {
        let ctl = UploadController::new(MockService::failing());
        ctl.select(jpeg_blob());

        // Populate a notice through a failed action.
        ctl.mark().await;
        assert!(ctl.notice().is_some());

        let ctl_ok = UploadController::new(MockService::ok());
        ctl_ok.select(jpeg_blob());
        ctl_ok.recognize().await;
        assert_eq!(ctl_ok.results().len(), 1);

        // New selection wipes both.
        ctl_ok.select(jpeg_blob());
        assert!(ctl_ok.results().is_empty());
        assert!(ctl_ok.notice().is_none());

        ctl.select(jpeg_blob());
        assert!(ctl.notice().is_none());
    }

    #[tokio::test]
    async fn actions_without_selection_are_no_ops() {
        let service = MockService::ok();
        let ctl = UploadController::new(service.clone());

        assert!(!ctl.recognize().await);
        assert!(!ctl.mark().await);
        assert_eq!(service.recognize_calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.mark_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn recognize_stores_results() {
        let ctl = UploadController::new(MockService::ok());
        ctl.select(jpeg_blob());

        assert!(ctl.recognize().await);
        let results = ctl.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].label.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn mark_sets_success_notice() {
        let ctl = UploadController::new(MockService::ok());
        ctl.select(jpeg_blob());

        assert!(ctl.mark().await);
        let notice = ctl.notice().unwrap();
        assert_eq!(notice.severity, Severity::Success);
        assert_eq!(notice.text, "Présence enregistrée pour: Alice, Bob");
    }

    #[tokio::test]
    async fn failures_reduce_to_generic_messages() {
        let ctl = UploadController::new(MockService::failing());
        ctl.select(jpeg_blob());

        ctl.recognize().await;
        assert_eq!(ctl.notice().unwrap().text, "Erreur lors de la reconnaissance");

        ctl.mark().await;
        assert_eq!(ctl.notice().unwrap().text, "Erreur lors du marquage de présence");

        ctl.fetch_report().await;
        assert_eq!(
            ctl.notice().unwrap().text,
            "Erreur lors de la récupération du rapport"
        );
        assert!(ctl.report().is_none());
    }

    #[tokio::test]
    async fn fetch_report_stores_snapshot() {
        let ctl = UploadController::new(MockService::ok());
        ctl.fetch_report().await;
        let report = ctl.report().unwrap();
        assert_eq!(report.present, ["Alice"]);
        assert_eq!(report.count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_actions_are_not_suppressed() {
        // No single-flight guard on the upload path: two concurrent
        // marks both reach the service.
        let service = MockService::slow(Duration::from_millis(200));
        let ctl = Arc::new(UploadController::new(service.clone()));
        ctl.select(jpeg_blob());

        let a = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.mark().await })
        };
        let b = {
            let ctl = ctl.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                ctl.mark().await
            })
        };
        assert!(a.await.unwrap());
        assert!(b.await.unwrap());
        assert_eq!(service.mark_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn select_file_reads_bytes_and_infers_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("class.jpg");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

        let ctl = UploadController::new(MockService::ok());
        ctl.select_file(&path).await.unwrap();

        let blob = ctl.selection().unwrap();
        assert_eq!(blob.mime, "image/jpeg");
        assert_eq!(blob.filename, "class.jpg");
        assert_eq!(blob.bytes, vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert!(blob.is_image());
    }

    #[test]
    fn mime_inference_covers_common_extensions() {
        assert_eq!(mime_for_path(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("a.webp")), "image/webp");
        assert_eq!(mime_for_path(Path::new("notes.txt")), "application/octet-stream");
        assert_eq!(mime_for_path(Path::new("noext")), "application/octet-stream");
    }
}
