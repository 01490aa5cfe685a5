//! presence-api — Typed gateway to the attendance backend.
//!
//! Wraps the backend's HTTP endpoints (recognize, mark-attendance,
//! report, reset, known-students, CSV export, health) behind the
//! [`AttendanceService`] trait, isolating the rest of the client from
//! transport details.

pub mod client;
pub mod error;
pub mod service;
pub mod types;

pub use client::ApiClient;
pub use error::{ApiError, Operation};
pub use service::AttendanceService;
pub use types::{
    AttendanceReport, CsvExport, HealthStatus, ImageBlob, MarkOutcome, RecognitionResult,
    RecognitionStatus, ResetAck, Statistics,
};
