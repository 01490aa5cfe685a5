//! presence-hw — Webcam access for the capture client.
//!
//! Opens a V4L2 device, negotiates a pixel format the encoder can
//! handle (MJPG passthrough, or YUYV/GREY converted and re-encoded),
//! and produces JPEG blobs ready for multipart upload.

pub mod camera;
pub mod frame;

pub use camera::{Camera, CameraError, DeviceInfo, PixelFormat};
