use crate::{CaptureDriver, Error, Frame, MockFill, PixelFormat, Result};
use time::OffsetDateTime;

/// Handle to one opened mock device.
#[derive(Debug)]
pub struct MockHandle {
    index: u32,
    served: u64,
}

impl MockHandle {
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// In-process camera producing deterministic BGR frames. Counts every
/// open, read and release so lifecycle behaviour can be checked.
#[derive(Debug, Clone)]
pub struct MockDriver {
    width: u32,
    height: u32,
    fill: MockFill,
    frame_budget: Option<u64>,
    missing_every: Option<u64>,
    unavailable: bool,
    open_fault: bool,
    failing_release: bool,
    opens: usize,
    reads: u64,
    releases: usize,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            fill: MockFill::Ramp,
            frame_budget: None,
            missing_every: None,
            unavailable: false,
            open_fault: false,
            failing_release: false,
            opens: 0,
            reads: 0,
            releases: 0,
        }
    }
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fill(mut self, fill: MockFill) -> Self {
        self.fill = fill;
        self
    }

    /// Constant-colour frames, given in device order.
    pub fn solid(self, b: u8, g: u8, r: u8) -> Self {
        self.with_fill(MockFill::Solid([b, g, r]))
    }

    /// After `n` frames the device reports no more data.
    pub fn frame_budget(mut self, n: u64) -> Self {
        self.frame_budget = Some(n);
        self
    }

    /// Every `n`th read produces no frame.
    pub fn missing_every(mut self, n: u64) -> Self {
        self.missing_every = Some(n.max(1));
        self
    }

    /// Opening any device fails.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Opening fails with a backend error rather than a missing device.
    pub fn open_fault(mut self) -> Self {
        self.open_fault = true;
        self
    }

    /// Releasing a device fails; the release is not counted.
    pub fn failing_release(mut self) -> Self {
        self.failing_release = true;
        self
    }

    pub fn opens(&self) -> usize {
        self.opens
    }

    pub fn reads(&self) -> u64 {
        self.reads
    }

    pub fn releases(&self) -> usize {
        self.releases
    }

    fn render(&self) -> Vec<u8> {
        let (w, h) = (self.width, self.height);
        let mut data = Vec::with_capacity(w as usize * h as usize * 3);
        match self.fill {
            MockFill::Solid(bgr) => {
                for _ in 0..(w as usize * h as usize) {
                    data.extend_from_slice(&bgr);
                }
            }
            MockFill::Ramp => {
                for y in 0..h {
                    for x in 0..w {
                        data.push(((x + y) % 256) as u8);
                        data.push((x % 256) as u8);
                        data.push((y % 256) as u8);
                    }
                }
            }
        }
        data
    }
}

impl CaptureDriver for MockDriver {
    type Handle = MockHandle;

    fn name(&self) -> &'static str {
        "mock"
    }

    fn open(&mut self, index: u32) -> Result<MockHandle> {
        if self.unavailable {
            return Err(Error::DeviceUnavailable(format!("mock camera {index}")));
        }
        if self.open_fault {
            return Err(Error::Backend(format!("mock camera {index} driver fault")));
        }
        self.opens += 1;
        Ok(MockHandle { index, served: 0 })
    }

    fn read(&mut self, handle: &mut MockHandle) -> Result<Option<Frame>> {
        self.reads += 1;
        if let Some(n) = self.missing_every {
            if self.reads % n == 0 {
                return Ok(None);
            }
        }
        if let Some(budget) = self.frame_budget {
            if handle.served >= budget {
                return Ok(None);
            }
        }
        handle.served += 1;
        let frame = Frame::new(self.width, self.height, PixelFormat::Bgr8, self.render())?;
        Ok(Some(frame.with_timestamp(OffsetDateTime::now_utc())))
    }

    fn release(&mut self, handle: MockHandle) -> Result<()> {
        if self.failing_release {
            return Err(Error::Backend(format!(
                "mock camera {} refused release",
                handle.index
            )));
        }
        self.releases += 1;
        Ok(())
    }
}
