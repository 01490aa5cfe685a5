//! V4L2 webcam capture via the `v4l` crate.

use crate::frame;
use std::path::Path;
use thiserror::Error;
use v4l::buffer::Type as BufType;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    #[error("device busy")]
    DeviceBusy,
    #[error("format negotiation failed: {0}")]
    FormatNegotiationFailed(String),
    #[error("streaming not supported")]
    StreamingNotSupported,
    #[error("frame not usable yet (camera warming up or covered)")]
    FrameNotReady,
    #[error(transparent)]
    Frame(#[from] frame::FrameError),
}

/// Info about a discovered V4L2 device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: String,
    pub bus: String,
}

/// Negotiated pixel format for the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Motion-JPEG: frames are already JPEG, passed through untouched.
    Mjpg,
    /// YUYV 4:2:2 packed, converted to RGB and re-encoded.
    Yuyv,
    /// 8-bit grayscale (IR cameras), re-encoded as grayscale JPEG.
    Grey,
}

/// V4L2 webcam handle producing upload-ready JPEG frames.
pub struct Camera {
    device: Device,
    pub width: u32,
    pub height: u32,
    pub device_path: String,
    pub fourcc: FourCC,
    pixel_format: PixelFormat,
}

impl Camera {
    /// Open a V4L2 camera device by path (e.g., "/dev/video0").
    ///
    /// Requests MJPG at 1280x720 and accepts whatever the driver
    /// negotiates, as long as it is a format the encoder can handle.
    pub fn open(device_path: &str) -> Result<Self, CameraError> {
        if !Path::new(device_path).exists() {
            return Err(CameraError::DeviceNotFound(device_path.to_string()));
        }

        let device = Device::with_path(device_path).map_err(|e| {
            if e.to_string().contains("busy") || e.to_string().contains("EBUSY") {
                CameraError::DeviceBusy
            } else {
                CameraError::DeviceNotFound(format!("{device_path}: {e}"))
            }
        })?;

        let caps = device.query_caps().map_err(|e| {
            CameraError::CaptureFailed(format!("failed to query capabilities: {e}"))
        })?;

        tracing::info!(
            device = device_path,
            driver = %caps.driver,
            card = %caps.card,
            "opened camera"
        );

        if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
            return Err(CameraError::StreamingNotSupported);
        }

        let mut fmt = device.format().map_err(|e| {
            CameraError::FormatNegotiationFailed(format!("failed to get format: {e}"))
        })?;

        fmt.fourcc = FourCC::new(b"MJPG");
        fmt.width = 1280;
        fmt.height = 720;

        let negotiated = device.set_format(&fmt).map_err(|e| {
            CameraError::FormatNegotiationFailed(format!("failed to set format: {e}"))
        })?;

        let fourcc = negotiated.fourcc;
        let pixel_format = if fourcc == FourCC::new(b"MJPG") {
            PixelFormat::Mjpg
        } else if fourcc == FourCC::new(b"YUYV") {
            PixelFormat::Yuyv
        } else if fourcc == FourCC::new(b"GREY") {
            PixelFormat::Grey
        } else {
            return Err(CameraError::FormatNegotiationFailed(format!(
                "unsupported pixel format: {fourcc:?} (need MJPG, YUYV, or GREY)"
            )));
        };

        tracing::info!(
            width = negotiated.width,
            height = negotiated.height,
            fourcc = ?fourcc,
            "negotiated format"
        );

        Ok(Self {
            device,
            width: negotiated.width,
            height: negotiated.height,
            device_path: device_path.to_string(),
            fourcc,
            pixel_format,
        })
    }

    /// Capture a single frame and return it as JPEG bytes.
    ///
    /// Returns [`CameraError::FrameNotReady`] for dark frames (sensor
    /// warming up, lid closed) so callers can skip the cycle silently.
    pub fn capture_jpeg(&self) -> Result<Vec<u8>, CameraError> {
        let mut stream =
            MmapStream::with_buffers(&self.device, BufType::VideoCapture, 4).map_err(|e| {
                CameraError::CaptureFailed(format!("failed to create mmap stream: {e}"))
            })?;

        let (buf, meta) = stream
            .next()
            .map_err(|e| CameraError::CaptureFailed(format!("failed to dequeue buffer: {e}")))?;

        match self.pixel_format {
            PixelFormat::Mjpg => {
                // Sanity check the SOI marker; some drivers emit junk
                // frames right after stream-on.
                if buf.len() < 2 || buf[0] != 0xFF || buf[1] != 0xD8 {
                    tracing::debug!(seq = meta.sequence, "discarding non-JPEG MJPG buffer");
                    return Err(CameraError::FrameNotReady);
                }
                Ok(buf.to_vec())
            }
            PixelFormat::Yuyv => {
                if frame::is_dark_luma(frame::yuyv_luma(buf), 0.95) {
                    tracing::debug!(seq = meta.sequence, "skipping dark frame");
                    return Err(CameraError::FrameNotReady);
                }
                let rgb = frame::yuyv_to_rgb(buf, self.width, self.height)?;
                Ok(frame::encode_rgb_jpeg(&rgb, self.width, self.height)?)
            }
            PixelFormat::Grey => {
                let pixels = (self.width * self.height) as usize;
                if buf.len() < pixels {
                    return Err(CameraError::CaptureFailed(format!(
                        "GREY buffer too short: expected {pixels}, got {}",
                        buf.len()
                    )));
                }
                let gray = &buf[..pixels];
                if frame::is_dark_luma(gray.iter().copied(), 0.95) {
                    tracing::debug!(seq = meta.sequence, "skipping dark frame");
                    return Err(CameraError::FrameNotReady);
                }
                Ok(frame::encode_gray_jpeg(gray, self.width, self.height)?)
            }
        }
    }

    /// List available V4L2 video capture devices.
    pub fn list_devices() -> Vec<DeviceInfo> {
        let mut devices = Vec::new();

        for i in 0..16 {
            let path = format!("/dev/video{i}");
            if !Path::new(&path).exists() {
                continue;
            }
            let Ok(dev) = Device::with_path(&path) else {
                continue;
            };
            let Ok(caps) = dev.query_caps() else {
                continue;
            };
            if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
                continue;
            }
            devices.push(DeviceInfo {
                path,
                name: caps.card.clone(),
                driver: caps.driver.clone(),
                bus: caps.bus.clone(),
            });
        }

        devices
    }
}
