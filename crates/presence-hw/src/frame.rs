//! Pixel format conversion and JPEG encoding for captured frames.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use std::io::Cursor;

/// JPEG quality for re-encoded frames. The backend decodes with
/// OpenCV and tolerates lossy input; 85 keeps uploads small.
const JPEG_QUALITY: u8 = 85;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid buffer length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("JPEG encoding failed: {0}")]
    EncodeFailed(String),
}

/// Convert packed YUYV (4:2:2) to interleaved RGB8.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V], with U/V shared
/// by both pixels. Uses the BT.601 integer conversion.
pub fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height * 2) as usize;
    if yuyv.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: yuyv.len(),
        });
    }

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for chunk in yuyv[..expected].chunks_exact(4) {
        let (y0, u, y1, v) = (chunk[0], chunk[1], chunk[2], chunk[3]);
        push_yuv_pixel(&mut rgb, y0, u, v);
        push_yuv_pixel(&mut rgb, y1, u, v);
    }
    Ok(rgb)
}

fn push_yuv_pixel(rgb: &mut Vec<u8>, y: u8, u: u8, v: u8) {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;

    let r = (298 * c + 409 * e + 128) >> 8;
    let g = (298 * c - 100 * d - 208 * e + 128) >> 8;
    let b = (298 * c + 516 * d + 128) >> 8;

    rgb.push(r.clamp(0, 255) as u8);
    rgb.push(g.clamp(0, 255) as u8);
    rgb.push(b.clamp(0, 255) as u8);
}

/// Check whether a frame is dark (camera still warming up, lid closed,
/// privacy shutter). Operates on the luma channel of a YUYV buffer or
/// a plain grayscale buffer.
///
/// Returns true if more than `threshold_pct` of pixels fall below
/// luma 32.
pub fn is_dark_luma(luma: impl Iterator<Item = u8>, threshold_pct: f32) -> bool {
    let mut dark = 0usize;
    let mut total = 0usize;
    for p in luma {
        total += 1;
        if p < 32 {
            dark += 1;
        }
    }
    if total == 0 {
        return true;
    }
    (dark as f32 / total as f32) > threshold_pct
}

/// Luma channel iterator over a packed YUYV buffer.
pub fn yuyv_luma(yuyv: &[u8]) -> impl Iterator<Item = u8> + '_ {
    yuyv.iter().step_by(2).copied()
}

/// Encode an interleaved RGB8 buffer as JPEG.
pub fn encode_rgb_jpeg(rgb: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height * 3) as usize;
    if rgb.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: rgb.len(),
        });
    }

    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode(&rgb[..expected], width, height, ExtendedColorType::Rgb8)
        .map_err(|e| FrameError::EncodeFailed(e.to_string()))?;
    Ok(out.into_inner())
}

/// Encode an 8-bit grayscale buffer as JPEG.
pub fn encode_gray_jpeg(gray: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height) as usize;
    if gray.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: gray.len(),
        });
    }

    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode(&gray[..expected], width, height, ExtendedColorType::L8)
        .map_err(|e| FrameError::EncodeFailed(e.to_string()))?;
    Ok(out.into_inner())
}
