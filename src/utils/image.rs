//! Image loading for the cascade.

use std::path::Path;

use image::{ImageReader, RgbImage};

use crate::core::errors::EcgError;

/// Loads an image file as 8-bit RGB.
///
/// Files larger than `max_bytes` are refused before decoding. When the extension does
/// not match the content, the format is guessed from the file header instead.
pub fn load_image(path: &Path, max_bytes: u64) -> Result<RgbImage, EcgError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        EcgError::invalid_input(format!("cannot read image {}: {}", path.display(), e))
    })?;
    if !metadata.is_file() {
        return Err(EcgError::invalid_input(format!(
            "{} is not a file",
            path.display()
        )));
    }
    if metadata.len() > max_bytes {
        return Err(EcgError::invalid_input(format!(
            "image {} is {} bytes, larger than the {} byte limit",
            path.display(),
            metadata.len(),
            max_bytes
        )));
    }

    let decoded = match image::open(path) {
        Ok(img) => img,
        Err(first) => {
            tracing::debug!(
                "Decoding {} by extension failed ({}), guessing format",
                path.display(),
                first
            );
            ImageReader::open(path)?
                .with_guessed_format()?
                .decode()
                .map_err(|e| {
                    EcgError::invalid_input(format!(
                        "cannot decode image {}: {}",
                        path.display(),
                        e
                    ))
                })?
        }
    };
    let rgb = decoded.to_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(EcgError::invalid_input(format!(
            "image {} has no pixels",
            path.display()
        )));
    }
    Ok(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ecg.png");
        RgbImage::from_pixel(8, 4, image::Rgb([255, 0, 0]))
            .save(&path)
            .unwrap();
        let img = load_image(&path, 1 << 20).unwrap();
        assert_eq!(img.dimensions(), (8, 4));
    }

    #[test]
    fn test_wrong_extension_is_sniffed() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("ecg.png");
        RgbImage::new(5, 5).save(&png).unwrap();
        let mislabeled = dir.path().join("ecg.jpg");
        std::fs::rename(&png, &mislabeled).unwrap();
        assert_eq!(load_image(&mislabeled, 1 << 20).unwrap().dimensions(), (5, 5));
    }

    #[test]
    fn test_rejects_missing_oversized_and_garbage() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_image(&dir.path().join("none.png"), 1 << 20),
            Err(EcgError::InvalidInput { .. })
        ));

        let path = dir.path().join("big.png");
        RgbImage::new(64, 64).save(&path).unwrap();
        assert!(matches!(
            load_image(&path, 10),
            Err(EcgError::InvalidInput { .. })
        ));

        let garbage = dir.path().join("garbage.png");
        std::fs::write(&garbage, b"definitely not an image").unwrap();
        assert!(load_image(&garbage, 1 << 20).is_err());
    }
}
