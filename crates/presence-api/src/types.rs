use serde::{Deserialize, Serialize};

/// Attendance snapshot as of the last successful report fetch.
///
/// `count` equals `present.len()` at fetch time; staleness between
/// fetches is expected and never reconciled incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceReport {
    pub present: Vec<String>,
    pub absent: Vec<String>,
    pub count: usize,
    /// Aggregate statistics. Older backends omit this block.
    #[serde(default)]
    pub statistics: Option<Statistics>,
}

/// Aggregate attendance statistics returned alongside the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    pub total_students: usize,
    pub present: usize,
    pub absent: usize,
    /// Percentage in [0, 100].
    pub attendance_rate: f32,
}

/// Match status for a single detected face.
///
/// Anything the server sends other than `recognized` collapses to
/// `Unknown` rather than failing the whole response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum RecognitionStatus {
    Recognized,
    Unknown,
}

impl From<String> for RecognitionStatus {
    fn from(s: String) -> Self {
        if s == "recognized" {
            Self::Recognized
        } else {
            Self::Unknown
        }
    }
}

/// One detected face from `/recognize-face`.
///
/// `label` and `confidence` carry meaning only when
/// `status == Recognized`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub status: RecognitionStatus,
    #[serde(default)]
    pub label: Option<String>,
    /// Confidence in [0, 1].
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// Envelope for `/recognize-face`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RecognizeResponse {
    pub results: Vec<RecognitionResult>,
}

/// Response of `/mark-attendance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkOutcome {
    pub status: String,
    pub recognized: Vec<String>,
    /// Identities first marked present by this request. Backends that
    /// predate the field omit it.
    #[serde(default)]
    pub newly_added: Vec<String>,
}

/// Acknowledgement of `/reset-attendance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetAck {
    pub message: String,
    pub count: usize,
}

/// Response of `/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub models_loaded: bool,
    pub known_students_count: usize,
    pub current_attendance: usize,
}

/// Downloaded CSV export plus the filename the server suggested.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// An encoded image ready for submission.
#[derive(Debug, Clone)]
pub struct ImageBlob {
    pub bytes: Vec<u8>,
    /// Declared media type, e.g. `image/jpeg`.
    pub mime: String,
    /// Filename sent in the multipart part.
    pub filename: String,
}

impl ImageBlob {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
            filename: filename.into(),
        }
    }

    /// A JPEG frame from the capture path.
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/jpeg", "capture.jpg")
    }

    /// Whether the declared media type is an image type.
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

impl MarkOutcome {
    pub fn has_new_identities(&self) -> bool {
        !self.newly_added.is_empty()
    }
}
