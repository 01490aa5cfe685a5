use crate::error::ApiError;
use crate::types::{
    AttendanceReport, CsvExport, HealthStatus, ImageBlob, MarkOutcome, RecognitionResult, ResetAck,
};
use async_trait::async_trait;

/// The backend operations the client depends on.
///
/// [`ApiClient`](crate::ApiClient) is the HTTP implementation;
/// controllers take `Arc<dyn AttendanceService>` so their timing and
/// ordering behavior is testable against in-memory fakes.
#[async_trait]
pub trait AttendanceService: Send + Sync {
    /// Recognize faces in an image. No attendance side effect.
    async fn recognize(&self, blob: &ImageBlob) -> Result<Vec<RecognitionResult>, ApiError>;

    /// Recognize faces and mark the matched identities present.
    async fn mark_attendance(&self, blob: &ImageBlob) -> Result<MarkOutcome, ApiError>;

    /// Fetch the current attendance snapshot.
    async fn report(&self) -> Result<AttendanceReport, ApiError>;

    /// Clear all attendance marks.
    async fn reset(&self) -> Result<ResetAck, ApiError>;

    /// List every identity the backend can recognize.
    async fn known_students(&self) -> Result<Vec<String>, ApiError>;

    /// Download the absent-students CSV export.
    async fn download_absent_csv(&self) -> Result<CsvExport, ApiError>;

    /// Backend liveness and model status.
    async fn health(&self) -> Result<HealthStatus, ApiError>;
}
