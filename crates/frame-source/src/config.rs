//! YAML capture configuration.

use crate::{CaptureMode, MockFill};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Mock,
    Opencv,
    Still,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockSettings {
    pub width: u32,
    pub height: u32,
    pub fill: MockFill,
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            fill: MockFill::Ramp,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub camera_index: u32,
    /// Kept as text; an unknown value is reported when frames are read.
    pub mode: String,
    pub backend: BackendKind,
    /// Directory of images for the `still` backend.
    pub still_dir: Option<PathBuf>,
    pub mock: MockSettings,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            mode: CaptureMode::default().as_str().to_string(),
            backend: BackendKind::default(),
            still_dir: None,
            mock: MockSettings::default(),
        }
    }
}

#[cfg(feature = "mock")]
impl MockSettings {
    pub fn driver(&self) -> crate::MockDriver {
        crate::MockDriver::new()
            .with_size(self.width, self.height)
            .with_fill(self.fill)
    }
}

pub fn load_config_file(path: impl AsRef<Path>) -> anyhow::Result<SourceConfig> {
    let path = path.as_ref();
    let raw =
        fs::read_to_string(path).with_context(|| format!("reading config: {}", path.display()))?;
    parse_config(&raw).with_context(|| format!("parsing yaml: {}", path.display()))
}

pub fn parse_config(raw: &str) -> anyhow::Result<SourceConfig> {
    if raw.trim().is_empty() {
        return Ok(SourceConfig::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_camera_zero_greyscale() {
        let cfg = SourceConfig::default();
        assert_eq!(cfg.camera_index, 0);
        assert_eq!(cfg.mode, "RGB");
        assert_eq!(cfg.backend, BackendKind::Mock);
        assert_eq!(parse_config("").unwrap(), cfg);
    }

    #[test]
    fn test_parse_partial_config() {
        let cfg = parse_config("camera_index: 2\nmode: G\nmock:\n  width: 64\n").unwrap();
        assert_eq!(cfg.camera_index, 2);
        assert_eq!(cfg.mode, "G");
        assert_eq!(cfg.mock.width, 64);
        assert_eq!(cfg.mock.height, 240);
        assert_eq!(cfg.mock.fill, MockFill::Ramp);
    }

    #[test]
    fn test_parse_fill_and_backend() {
        let cfg = parse_config("backend: still\nstill_dir: /tmp/frames\nmock:\n  fill: [10, 20, 30]\n")
            .unwrap();
        assert_eq!(cfg.backend, BackendKind::Still);
        assert_eq!(cfg.still_dir, Some(PathBuf::from("/tmp/frames")));
        assert_eq!(cfg.mock.fill, MockFill::Solid([10, 20, 30]));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(parse_config("backend: firewire\n").is_err());
    }

    #[test]
    fn test_load_from_file() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "camera_index: 1\nmode: HSV")?;
        let cfg = load_config_file(file.path())?;
        assert_eq!(cfg.camera_index, 1);
        assert_eq!(cfg.mode, "HSV");
        Ok(())
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = load_config_file("/nonexistent/gazecap.yaml").unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }
}
