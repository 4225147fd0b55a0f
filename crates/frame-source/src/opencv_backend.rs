use crate::{CaptureDriver, Error, Frame, PixelFormat, Result};
use opencv::prelude::*;
use opencv::{core, videoio};
use time::OffsetDateTime;

/// Cameras reached through OpenCV's `VideoCapture`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCvDriver;

impl OpenCvDriver {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureDriver for OpenCvDriver {
    type Handle = videoio::VideoCapture;

    fn name(&self) -> &'static str {
        "opencv"
    }

    fn open(&mut self, index: u32) -> Result<videoio::VideoCapture> {
        let idx = i32::try_from(index)
            .map_err(|_| Error::DeviceUnavailable(format!("camera index {index} out of range")))?;
        let cap = videoio::VideoCapture::new(idx, videoio::CAP_ANY)
            .map_err(|e| Error::Backend(e.to_string()))?;
        let opened =
            videoio::VideoCapture::is_opened(&cap).map_err(|e| Error::Backend(e.to_string()))?;
        if !opened {
            return Err(Error::DeviceUnavailable(format!("camera {index}")));
        }
        Ok(cap)
    }

    fn read(&mut self, cap: &mut videoio::VideoCapture) -> Result<Option<Frame>> {
        let mut mat = core::Mat::default();
        let ok = cap
            .read(&mut mat)
            .map_err(|e| Error::DeviceUnavailable(e.to_string()))?;
        if !ok || mat.empty() {
            return Ok(None);
        }
        if mat.depth() != core::CV_8U {
            return Err(Error::InvalidFrame(format!(
                "expected 8-bit samples, got OpenCV depth {}",
                mat.depth()
            )));
        }
        if mat.channels() != 3 {
            return Err(Error::InvalidFrame(format!(
                "expected 3-channel capture, got {}",
                mat.channels()
            )));
        }

        let width = mat.cols() as u32;
        let height = mat.rows() as u32;

        // data_bytes needs contiguous storage
        let mat = if mat.is_continuous() {
            mat
        } else {
            mat.try_clone().map_err(|e| Error::Backend(e.to_string()))?
        };
        let data = mat
            .data_bytes()
            .map_err(|e| Error::Backend(e.to_string()))?
            .to_vec();
        let frame = Frame::new(width, height, PixelFormat::Bgr8, data)?;
        Ok(Some(frame.with_timestamp(OffsetDateTime::now_utc())))
    }

    fn release(&mut self, mut cap: videoio::VideoCapture) -> Result<()> {
        cap.release().map_err(|e| Error::Backend(e.to_string()))
    }
}
