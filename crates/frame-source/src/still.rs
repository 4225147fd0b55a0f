//! Replays still images from disk as if they came from a camera.

use crate::{CaptureDriver, Error, Frame, PixelFormat, Result};
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Debug, Clone)]
pub struct StillImageDriver {
    paths: Vec<PathBuf>,
    looping: bool,
}

#[derive(Debug)]
pub struct StillHandle {
    next: usize,
}

impl StillImageDriver {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            looping: false,
        }
    }

    /// All images in `dir`, in file name order.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        let entries = fs::read_dir(dir).map_err(|e| Error::Io(format!("{}: {e}", dir.display())))?;
        for entry in entries {
            let path = entry.map_err(|e| Error::Io(e.to_string()))?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)));
            if is_image {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(Self::new(paths))
    }

    /// Start over from the first image instead of running dry.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl CaptureDriver for StillImageDriver {
    type Handle = StillHandle;

    fn name(&self) -> &'static str {
        "still"
    }

    fn open(&mut self, index: u32) -> Result<StillHandle> {
        if self.paths.is_empty() {
            return Err(Error::DeviceUnavailable(format!(
                "still source {index} has no images"
            )));
        }
        Ok(StillHandle { next: 0 })
    }

    fn read(&mut self, handle: &mut StillHandle) -> Result<Option<Frame>> {
        if handle.next >= self.paths.len() {
            if !self.looping {
                return Ok(None);
            }
            handle.next = 0;
        }
        let path = &self.paths[handle.next];
        handle.next += 1;
        let rgb = image::open(path)
            .map_err(|e| Error::DeviceUnavailable(format!("{}: {e}", path.display())))?
            .to_rgb8();
        let (width, height) = rgb.dimensions();
        let mut data = rgb.into_raw();
        for px in data.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
        let frame = Frame::new(width, height, PixelFormat::Bgr8, data)?;
        Ok(Some(frame.with_timestamp(OffsetDateTime::now_utc())))
    }

    fn release(&mut self, handle: StillHandle) -> Result<()> {
        let _ = handle;
        Ok(())
    }
}
