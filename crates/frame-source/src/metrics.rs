use crate::{Error, Frame, Result};
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

#[derive(Clone)]
pub struct CaptureCounters {
    pub frames_captured: IntCounter,
    pub frames_missing: IntCounter,
    pub mode_errors: IntCounter,
    pub read_errors: IntCounter,
    pub connected: IntGauge,
}

#[derive(Clone)]
pub struct CaptureMetrics {
    pub registry: Registry,
    pub capture: CaptureCounters,
}

impl CaptureMetrics {
    pub fn new() -> std::result::Result<Self, String> {
        let registry = Registry::new();
        let counter = |name: &str, help: &str| {
            IntCounter::new(name, help).map_err(|e| format!("metrics init error: {e}"))
        };
        let capture = CaptureCounters {
            frames_captured: counter("gazecap_frames_captured", "Frames returned to the caller")?,
            frames_missing: counter("gazecap_frames_missing", "Reads where the device had no frame")?,
            mode_errors: counter("gazecap_mode_errors", "Reads rejected for an unrecognised mode")?,
            read_errors: counter("gazecap_read_errors", "Reads that failed for any other reason")?,
            connected: IntGauge::new("gazecap_connected", "1 while a device is held")
                .map_err(|e| format!("metrics init error: {e}"))?,
        };
        let _ = registry.register(Box::new(capture.frames_captured.clone()));
        let _ = registry.register(Box::new(capture.frames_missing.clone()));
        let _ = registry.register(Box::new(capture.mode_errors.clone()));
        let _ = registry.register(Box::new(capture.read_errors.clone()));
        let _ = registry.register(Box::new(capture.connected.clone()));
        Ok(Self { registry, capture })
    }

    /// Count the outcome of one `read_frame` call.
    pub fn observe(&self, outcome: &Result<Option<Frame>>) {
        match outcome {
            Ok(Some(_)) => self.capture.frames_captured.inc(),
            Ok(None) => self.capture.frames_missing.inc(),
            Err(Error::UnrecognizedMode(_)) => self.capture.mode_errors.inc(),
            Err(_) => self.capture.read_errors.inc(),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.capture.connected.set(i64::from(connected));
    }

    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            return format!("error encoding metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_outcomes() {
        let m = CaptureMetrics::new().unwrap();
        m.observe(&Ok(Some(Frame::solid_bgr(1, 1, [0, 0, 0]))));
        m.observe(&Ok(Some(Frame::solid_bgr(1, 1, [0, 0, 0]))));
        m.observe(&Ok(None));
        m.observe(&Err(Error::UnrecognizedMode("X".into())));
        m.observe(&Err(Error::DeviceUnavailable("gone".into())));
        m.set_connected(true);

        assert_eq!(m.capture.frames_captured.get(), 2);
        assert_eq!(m.capture.frames_missing.get(), 1);
        assert_eq!(m.capture.mode_errors.get(), 1);
        assert_eq!(m.capture.read_errors.get(), 1);
        assert_eq!(m.capture.connected.get(), 1);

        let text = m.encode_text();
        assert!(text.contains("gazecap_frames_captured 2"));
        assert!(text.contains("gazecap_connected 1"));
    }
}
