use crate::{Error, Frame, PixelFormat, Result};
use image::{GrayImage, RgbImage};
use std::path::Path;

/// Save a frame as PNG. Colour frames are written in RGB order.
pub fn write_png(path: impl AsRef<Path>, frame: &Frame) -> Result<()> {
    let path = path.as_ref();
    let (w, h) = (frame.width, frame.height);
    let invalid = || Error::InvalidFrame("buffer does not match frame size".to_string());
    let result = match frame.pixel_format {
        PixelFormat::Gray8 => GrayImage::from_raw(w, h, frame.data.clone())
            .ok_or_else(invalid)?
            .save(path),
        PixelFormat::Rgb8 => RgbImage::from_raw(w, h, frame.data.clone())
            .ok_or_else(invalid)?
            .save(path),
        PixelFormat::Bgr8 => {
            let mut data = frame.data.clone();
            for px in data.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
            RgbImage::from_raw(w, h, data).ok_or_else(invalid)?.save(path)
        }
    };
    result.map_err(|e| Error::Io(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_gray_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grey.png");
        let frame = Frame::new(3, 1, PixelFormat::Gray8, vec![0, 128, 255]).unwrap();
        write_png(&path, &frame).unwrap();
        let back = image::open(&path).unwrap().to_luma8();
        assert_eq!(back.into_raw(), vec![0, 128, 255]);
    }

    #[test]
    fn test_bgr_written_as_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colour.png");
        write_png(&path, &Frame::solid_bgr(1, 1, [10, 20, 30])).unwrap();
        let back = image::open(&path).unwrap().to_rgb8();
        assert_eq!(back.into_raw(), vec![30, 20, 10]);
    }
}
