//! presence-core — Client behavior for the attendance system.
//!
//! Owns the ephemeral session state and the two request paths: the
//! capture path (webcam frames, single-flight, optional auto-cycle)
//! and the upload path (user-chosen files, no concurrency guard).
//! Both are generic over the [`AttendanceService`] gateway trait and a
//! [`FrameSource`] trait, so every timing and ordering property is
//! testable without a camera or a network.
//!
//! [`AttendanceService`]: presence_api::AttendanceService
//! [`FrameSource`]: capture::FrameSource

pub mod capture;
pub mod render;
pub mod session;
pub mod upload;

pub use capture::{AutoCycle, CaptureController, CaptureOutcome, CaptureSettings, FrameSource};
pub use session::{Notice, Phase, Session, Severity, SharedSession};
pub use upload::UploadController;
