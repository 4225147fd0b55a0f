use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PixelFormat {
    Bgr8,
    Rgb8,
    Gray8,
}

impl PixelFormat {
    /// Interleaved samples per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Bgr8 | PixelFormat::Rgb8 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// One captured image, row-major with interleaved channels.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    pub data: Vec<u8>,
    pub ts: Option<OffsetDateTime>,
}

impl Frame {
    /// Build a frame, checking that `data` matches the declared geometry.
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * pixel_format.channels();
        if data.len() != expected {
            return Err(Error::InvalidFrame(format!(
                "{width}x{height} {pixel_format:?} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixel_format,
            data,
            ts: None,
        })
    }

    /// A frame in camera layout where every pixel is `[b, g, r]`.
    pub fn solid_bgr(width: u32, height: u32, bgr: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            data.extend_from_slice(&bgr);
        }
        Self {
            width,
            height,
            pixel_format: PixelFormat::Bgr8,
            data,
            ts: None,
        }
    }

    pub fn with_timestamp(mut self, ts: OffsetDateTime) -> Self {
        self.ts = Some(ts);
        self
    }

    pub fn channels(&self) -> usize {
        self.pixel_format.channels()
    }

    /// Samples of the pixel at column `x`, row `y`.
    pub fn sample(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let c = self.channels();
        let start = (y as usize * self.width as usize + x as usize) * c;
        self.data.get(start..start + c)
    }

    /// Mean over every sample in the frame; 0.0 for an empty frame.
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.data.iter().map(|&v| u64::from(v)).sum();
        sum as f64 / self.data.len() as f64
    }
}

/// How a captured colour frame is reduced before it is handed to the tracker.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum CaptureMode {
    Red,
    Green,
    Blue,
    /// Luminance of the full colour frame.
    #[default]
    Grey,
}

impl CaptureMode {
    pub const ALL: [CaptureMode; 4] = [
        CaptureMode::Red,
        CaptureMode::Green,
        CaptureMode::Blue,
        CaptureMode::Grey,
    ];

    /// Short form used in configs and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            CaptureMode::Red => "R",
            CaptureMode::Green => "G",
            CaptureMode::Blue => "B",
            CaptureMode::Grey => "RGB",
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptureMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "R" => return Ok(CaptureMode::Red),
            "G" => return Ok(CaptureMode::Green),
            "B" => return Ok(CaptureMode::Blue),
            "RGB" => return Ok(CaptureMode::Grey),
            _ => {}
        }
        match s.to_ascii_lowercase().as_str() {
            "red" => Ok(CaptureMode::Red),
            "green" => Ok(CaptureMode::Green),
            "blue" => Ok(CaptureMode::Blue),
            "grey" | "gray" | "greyscale" | "grayscale" => Ok(CaptureMode::Grey),
            _ => Err(Error::UnrecognizedMode(s.to_string())),
        }
    }
}

/// Pixel content of synthetic frames.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MockFill {
    /// Diagonal ramp, different per channel.
    Ramp,
    /// Every pixel is `[b, g, r]`.
    #[serde(untagged)]
    Solid([u8; 3]),
}
