//! frame-source: camera frame acquisition for the eye-tracking pipeline
//!
//! A [`WebcamSource`] owns one capture device, pulls a frame per request and
//! reduces it to a single colour plane or to greyscale. Devices are reached
//! through the [`CaptureDriver`] capability so the source runs against real
//! cameras (`opencv`), still images (`image-io`) or the default `mock` backend.

mod types;
pub use types::{CaptureMode, Frame, MockFill, PixelFormat};

mod error;
pub use error::{Error, Result};

mod traits;
pub use traits::CaptureDriver;

mod log;
#[cfg(feature = "mock")]
pub use log::{LogRecord, MemorySink};
pub use log::{LogSink, TracingSink};

pub mod convert;

mod source;
pub use source::WebcamSource;

pub mod config;
pub use config::{load_config_file, BackendKind, SourceConfig};

mod metrics;
pub use metrics::{CaptureCounters, CaptureMetrics};

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "mock")]
pub use mock::{MockDriver, MockHandle};

#[cfg(feature = "opencv")]
mod opencv_backend;
#[cfg(feature = "opencv")]
pub use opencv_backend::OpenCvDriver;

#[cfg(feature = "image-io")]
mod still;
#[cfg(feature = "image-io")]
pub use still::{StillHandle, StillImageDriver};

#[cfg(feature = "image-io")]
pub mod io;
