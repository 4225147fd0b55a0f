use crate::{Frame, Result};

/// Capability set of a camera driver: open a device, pull frames, release it.
///
/// Frames come back in the driver's native layout; cameras deliver `Bgr8`.
pub trait CaptureDriver {
    /// Live connection to one device. Owned by exactly one caller.
    type Handle;

    /// Short backend name for logs and listings.
    fn name(&self) -> &'static str;

    /// Open the device identified by `index`.
    fn open(&mut self, index: u32) -> Result<Self::Handle>;

    /// Block until the next frame is available. `Ok(None)` means the device
    /// produced no frame this time.
    fn read(&mut self, handle: &mut Self::Handle) -> Result<Option<Frame>>;

    /// Give the device back.
    fn release(&mut self, handle: Self::Handle) -> Result<()>;
}
