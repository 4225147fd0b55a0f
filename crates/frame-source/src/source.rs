//! The webcam source handed to the eye-tracking pipeline.
//!
//! Lifecycle is `Disconnected -> Connected -> Disconnected`. `read_frame`
//! only works while connected and blocks for as long as the driver does.

use crate::convert::apply_mode;
use crate::{CaptureDriver, CaptureMode, Error, Frame, LogSink, Result, TracingSink};

const SRC_CONNECT: &str = "frame_source::webcam::connect";
const SRC_READ: &str = "frame_source::webcam::read_frame";
const SRC_CLOSE: &str = "frame_source::webcam::close";

/// Mode as given at connect time. Unknown text is kept and reported on read.
#[derive(Clone, Debug, PartialEq, Eq)]
enum ModeSetting {
    Known(CaptureMode),
    Unrecognized(String),
}

struct Session<H> {
    handle: H,
    camera_index: u32,
    mode: ModeSetting,
}

/// Exclusive owner of one camera device.
pub struct WebcamSource<D: CaptureDriver, L: LogSink = TracingSink> {
    driver: D,
    sink: L,
    session: Option<Session<D::Handle>>,
}

impl<D: CaptureDriver> WebcamSource<D> {
    pub fn new(driver: D) -> Self {
        Self::with_sink(driver, TracingSink)
    }
}

impl<D: CaptureDriver, L: LogSink> WebcamSource<D, L> {
    pub fn with_sink(driver: D, sink: L) -> Self {
        Self {
            driver,
            sink,
            session: None,
        }
    }

    /// Open camera `camera_index` and remember `mode` for later reads.
    ///
    /// A no-op when already connected. An unrecognised `mode` is accepted
    /// here and surfaces as [`Error::UnrecognizedMode`] from [`Self::read_frame`].
    pub fn connect(&mut self, camera_index: u32, mode: &str) -> Result<()> {
        let setting = match mode.parse::<CaptureMode>() {
            Ok(m) => ModeSetting::Known(m),
            Err(_) => ModeSetting::Unrecognized(mode.to_string()),
        };
        self.open_session(camera_index, setting)
    }

    pub fn connect_with_mode(&mut self, camera_index: u32, mode: CaptureMode) -> Result<()> {
        self.open_session(camera_index, ModeSetting::Known(mode))
    }

    fn open_session(&mut self, camera_index: u32, mode: ModeSetting) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }
        self.sink.debug(
            SRC_CONNECT,
            &format!("Connecting to webcam {camera_index}."),
        );
        let handle = self.driver.open(camera_index).map_err(|e| {
            self.sink.error(
                SRC_CONNECT,
                &format!("Could not open webcam {camera_index}: {e}"),
            );
            match e {
                Error::DeviceUnavailable(_) => e,
                other => Error::DeviceUnavailable(other.to_string()),
            }
        })?;
        self.session = Some(Session {
            handle,
            camera_index,
            mode,
        });
        self.sink.debug(
            SRC_CONNECT,
            &format!("Successfully connected to webcam {camera_index}!"),
        );
        Ok(())
    }

    /// Next frame reduced per the connect-time mode.
    ///
    /// `Ok(None)` when the device had no frame; the caller owns any retry.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        let session = self.session.as_mut().ok_or(Error::NotConnected)?;
        let mode = match &session.mode {
            ModeSetting::Known(m) => *m,
            ModeSetting::Unrecognized(raw) => {
                let err = Error::UnrecognizedMode(raw.clone());
                self.sink.error(SRC_READ, &err.to_string());
                return Err(err);
            }
        };
        match self.driver.read(&mut session.handle)? {
            Some(raw) => apply_mode(&raw, mode).map(Some),
            None => Ok(None),
        }
    }

    /// Release the device. Fails with [`Error::NotConnected`] when there is
    /// nothing to release.
    pub fn close(&mut self) -> Result<()> {
        let session = self.session.take().ok_or(Error::NotConnected)?;
        self.sink.debug(SRC_CLOSE, "Disconnecting from webcam.");
        if let Err(e) = self.driver.release(session.handle) {
            self.sink.error(
                SRC_CLOSE,
                &format!("Releasing webcam {} failed: {e}", session.camera_index),
            );
            return Err(e);
        }
        self.sink.debug(SRC_CLOSE, "Successfully disconnected from webcam.");
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn camera_index(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.camera_index)
    }

    /// Recognised mode of the current session, if any.
    pub fn mode(&self) -> Option<CaptureMode> {
        match self.session.as_ref().map(|s| &s.mode) {
            Some(ModeSetting::Known(m)) => Some(*m),
            _ => None,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn sink(&self) -> &L {
        &self.sink
    }
}

impl<D: CaptureDriver, L: LogSink> Drop for WebcamSource<D, L> {
    fn drop(&mut self) {
        if self.session.is_some() {
            // Errors were already logged by close.
            let _ = self.close();
        }
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::{MemorySink, MockDriver, PixelFormat};
    use std::sync::Arc;
    use tracing::Level;

    fn solid_source() -> WebcamSource<MockDriver, Arc<MemorySink>> {
        let driver = MockDriver::new().with_size(16, 9).solid(10, 20, 30);
        WebcamSource::with_sink(driver, Arc::new(MemorySink::new()))
    }

    #[test]
    fn test_all_modes_single_channel_same_size() {
        for mode in CaptureMode::ALL {
            let mut src = solid_source();
            src.connect(0, mode.as_str()).unwrap();
            let frame = src.read_frame().unwrap().unwrap();
            assert_eq!((frame.width, frame.height), (16, 9));
            assert_eq!(frame.pixel_format, PixelFormat::Gray8);
            assert_eq!(frame.data.len(), 16 * 9);
        }
    }

    #[test]
    fn test_channel_modes_pick_bgr_planes() {
        for (mode, expected) in [("R", 30u8), ("G", 20), ("B", 10)] {
            let mut src = solid_source();
            src.connect(0, mode).unwrap();
            let frame = src.read_frame().unwrap().unwrap();
            assert!(frame.data.iter().all(|&v| v == expected), "mode {mode}");
        }
    }

    #[test]
    fn test_greyscale_white_and_black() {
        let mut src = WebcamSource::new(MockDriver::new().with_size(8, 8).solid(255, 255, 255));
        src.connect_with_mode(0, CaptureMode::Grey).unwrap();
        assert!(src.read_frame().unwrap().unwrap().data.iter().all(|&v| v == 255));

        let mut src = WebcamSource::new(MockDriver::new().with_size(8, 8).solid(0, 0, 0));
        src.connect_with_mode(0, CaptureMode::Grey).unwrap();
        assert!(src.read_frame().unwrap().unwrap().data.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut src = solid_source();
        src.connect(1, "RGB").unwrap();
        src.connect(3, "R").unwrap();
        assert_eq!(src.driver().opens(), 1);
        assert_eq!(src.camera_index(), Some(1));
        assert_eq!(src.mode(), Some(CaptureMode::Grey));
    }

    #[test]
    fn test_read_after_close_not_connected() {
        let mut src = solid_source();
        src.connect(0, "G").unwrap();
        src.close().unwrap();
        assert!(!src.is_connected());
        assert!(matches!(src.read_frame(), Err(Error::NotConnected)));
        assert_eq!(src.driver().releases(), 1);
    }

    #[test]
    fn test_read_and_close_before_connect() {
        let mut src = solid_source();
        assert!(matches!(src.read_frame(), Err(Error::NotConnected)));
        assert!(matches!(src.close(), Err(Error::NotConnected)));
        assert_eq!(src.driver().releases(), 0);
    }

    #[test]
    fn test_no_data_returns_none() {
        let driver = MockDriver::new().with_size(4, 4).frame_budget(1);
        let mut src = WebcamSource::new(driver);
        src.connect(0, "B").unwrap();
        assert!(src.read_frame().unwrap().is_some());
        assert!(src.read_frame().unwrap().is_none());
        assert!(src.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_unrecognized_mode_reported_on_read() {
        let mut src = solid_source();
        src.connect(0, "HSV").unwrap();
        assert!(src.is_connected());
        assert_eq!(src.mode(), None);

        let err = src.read_frame().unwrap_err();
        assert!(matches!(err, Error::UnrecognizedMode(ref m) if m == "HSV"));
        assert_eq!(src.driver().reads(), 0);

        let errors = src.sink().messages(Level::ERROR);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("HSV"));
    }

    #[test]
    fn test_open_failure_stays_disconnected() {
        let mut src = WebcamSource::new(MockDriver::new().unavailable());
        let err = src.connect(0, "RGB").unwrap_err();
        assert!(matches!(err, Error::DeviceUnavailable(_)));
        assert!(!src.is_connected());
        assert!(matches!(src.read_frame(), Err(Error::NotConnected)));
    }

    #[test]
    fn test_open_backend_fault_maps_to_unavailable() {
        let sink = Arc::new(MemorySink::new());
        let mut src = WebcamSource::with_sink(MockDriver::new().open_fault(), Arc::clone(&sink));
        let err = src.connect(4, "RGB").unwrap_err();
        assert!(matches!(err, Error::DeviceUnavailable(ref m) if m.contains("driver fault")));
        assert!(!src.is_connected());
        assert_eq!(src.camera_index(), None);

        let errors = sink.messages(Level::ERROR);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Could not open webcam 4"));
    }

    #[test]
    fn test_failed_release_still_disconnects() {
        let sink = Arc::new(MemorySink::new());
        let driver = MockDriver::new().with_size(4, 4).failing_release();
        let mut src = WebcamSource::with_sink(driver, Arc::clone(&sink));
        src.connect(1, "G").unwrap();

        let err = src.close().unwrap_err();
        assert!(matches!(err, Error::Backend(ref m) if m.contains("refused release")));
        assert!(!src.is_connected());
        assert!(matches!(src.close(), Err(Error::NotConnected)));
        assert!(matches!(src.read_frame(), Err(Error::NotConnected)));
        assert_eq!(sink.messages(Level::ERROR).len(), 1);
        assert!(!sink
            .messages(Level::DEBUG)
            .contains(&"Successfully disconnected from webcam.".to_string()));
    }

    #[test]
    fn test_lifecycle_logging() {
        let sink = Arc::new(MemorySink::new());
        let mut src = WebcamSource::with_sink(MockDriver::new(), Arc::clone(&sink));
        src.connect(2, "RGB").unwrap();
        src.close().unwrap();

        let debug = sink.messages(Level::DEBUG);
        assert_eq!(
            debug,
            vec![
                "Connecting to webcam 2.".to_string(),
                "Successfully connected to webcam 2!".to_string(),
                "Disconnecting from webcam.".to_string(),
                "Successfully disconnected from webcam.".to_string(),
            ]
        );
        assert!(sink.records().iter().all(|r| r.source.starts_with("frame_source::webcam")));
    }

    #[test]
    fn test_drop_releases_device() {
        let sink = Arc::new(MemorySink::new());
        {
            let mut src = WebcamSource::with_sink(MockDriver::new(), Arc::clone(&sink));
            src.connect(0, "RGB").unwrap();
        }
        assert!(sink
            .messages(Level::DEBUG)
            .contains(&"Successfully disconnected from webcam.".to_string()));
    }

    #[test]
    fn test_reconnect_after_close() {
        let mut src = solid_source();
        src.connect(0, "R").unwrap();
        src.close().unwrap();
        src.connect(1, "B").unwrap();
        assert_eq!(src.driver().opens(), 2);
        let frame = src.read_frame().unwrap().unwrap();
        assert!(frame.data.iter().all(|&v| v == 10));
    }
}
