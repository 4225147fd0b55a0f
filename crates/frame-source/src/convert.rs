//! Channel selection and colour-to-luminance reduction.
//!
//! Every function here returns a fresh `Gray8` frame with the input's width,
//! height and timestamp.

use crate::{CaptureMode, Error, Frame, PixelFormat, Result};

// BT.601 luma weights in Q14 fixed point; they sum to 1 << 14.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;
const LUMA_ROUND: u32 = 1 << (LUMA_SHIFT - 1);

/// Reduce `frame` according to `mode`.
pub fn apply_mode(frame: &Frame, mode: CaptureMode) -> Result<Frame> {
    match mode {
        CaptureMode::Red | CaptureMode::Green | CaptureMode::Blue => extract_channel(frame, mode),
        CaptureMode::Grey => to_grey(frame),
    }
}

/// Index of the named colour inside one interleaved pixel of `format`.
fn channel_index(format: PixelFormat, mode: CaptureMode) -> Option<usize> {
    match (format, mode) {
        (PixelFormat::Bgr8, CaptureMode::Blue) | (PixelFormat::Rgb8, CaptureMode::Red) => Some(0),
        (PixelFormat::Bgr8 | PixelFormat::Rgb8, CaptureMode::Green) => Some(1),
        (PixelFormat::Bgr8, CaptureMode::Red) | (PixelFormat::Rgb8, CaptureMode::Blue) => Some(2),
        _ => None,
    }
}

/// Copy out a single colour plane.
pub fn extract_channel(frame: &Frame, mode: CaptureMode) -> Result<Frame> {
    let idx = channel_index(frame.pixel_format, mode).ok_or_else(|| {
        Error::InvalidFrame(format!(
            "cannot take channel {mode} from a {:?} frame",
            frame.pixel_format
        ))
    })?;
    let stride = frame.channels();
    let data: Vec<u8> = frame
        .data
        .chunks_exact(stride)
        .map(|px| px[idx])
        .collect();
    gray_like(frame, data)
}

/// Luminance image of a colour frame. Grey input is copied as-is.
pub fn to_grey(frame: &Frame) -> Result<Frame> {
    let (ri, bi) = match frame.pixel_format {
        PixelFormat::Gray8 => return gray_like(frame, frame.data.clone()),
        PixelFormat::Bgr8 => (2, 0),
        PixelFormat::Rgb8 => (0, 2),
    };
    let data: Vec<u8> = frame
        .data
        .chunks_exact(3)
        .map(|px| luma(px[ri], px[1], px[bi]))
        .collect();
    gray_like(frame, data)
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = u32::from(r) * LUMA_R + u32::from(g) * LUMA_G + u32::from(b) * LUMA_B + LUMA_ROUND;
    // Max is (255 << 14) + LUMA_ROUND, which still shifts down to 255.
    (y >> LUMA_SHIFT) as u8
}

fn gray_like(src: &Frame, data: Vec<u8>) -> Result<Frame> {
    let mut out = Frame::new(src.width, src.height, PixelFormat::Gray8, data)?;
    out.ts = src.ts;
    Ok(out)
}
