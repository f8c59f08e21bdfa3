//! Picked files → embeddable `data:` URIs, and back again for display.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::DynamicImage;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path:   PathBuf,
        source: io::Error,
    },
    #[error("malformed data URI")]
    BadDataUri,
    #[error("failed to decode image payload: {0}")]
    BadImage(#[from] image::ImageError),
}

// ════════════════════════════════════════════════════════════════════════════
// Encoding — upload conversion
// ════════════════════════════════════════════════════════════════════════════

/// Convert picked files into `data:<mime>;base64,` URIs, upload order
/// preserved.
///
/// Files whose name doesn't carry a recognized image format are silently
/// skipped.  A read failure on any remaining file fails the whole batch,
/// so the caller's visible set is always either the previous complete set
/// or the next complete set.
pub fn encode_photos<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<String>, UploadError> {
    let mut out = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let format = match image::ImageFormat::from_path(path) {
            Ok(f) => f,
            Err(_) => {
                debug!("skipping non-image file {}", path.display());
                continue;
            }
        };
        let bytes = fs::read(path).map_err(|source| UploadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        out.push(format!(
            "data:{};base64,{}",
            format.to_mime_type(),
            BASE64.encode(&bytes)
        ));
    }
    Ok(out)
}

// ════════════════════════════════════════════════════════════════════════════
// Decoding — overlay display
// ════════════════════════════════════════════════════════════════════════════

/// Decode a `data:<mime>;base64,` URI back into pixels.
pub fn decode_data_uri(uri: &str) -> Result<DynamicImage, UploadError> {
    let payload = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or(UploadError::BadDataUri)?;
    let bytes = BASE64.decode(payload).map_err(|_| UploadError::BadDataUri)?;
    Ok(image::load_from_memory(&bytes)?)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// Write a real 2×2 PNG the image crate can decode again.
    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([200, 30, 30]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn mixed_batch_keeps_only_image_typed_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png");
        let note = dir.path().join("note.txt");
        fs::write(&note, b"not a photo").unwrap();
        let b = write_png(dir.path(), "b.png");

        let photos = encode_photos(&[a, note, b]).unwrap();
        assert_eq!(photos.len(), 2);
        for p in &photos {
            assert!(p.starts_with("data:image/png;base64,"), "got {p}");
        }
    }

    #[test]
    fn unreadable_image_fails_the_whole_batch() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_png(dir.path(), "good.png");
        let missing = dir.path().join("missing.png");

        let err = encode_photos(&[good, missing]).unwrap_err();
        assert!(matches!(err, UploadError::Read { .. }));
    }

    #[test]
    fn encode_then_decode_round_trips_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_png(dir.path(), "rt.png");
        let photos = encode_photos(&[p]).unwrap();
        let img = decode_data_uri(&photos[0]).unwrap();
        assert_eq!((img.width(), img.height()), (2, 2));
    }

    #[test]
    fn garbage_uri_is_rejected() {
        assert!(matches!(
            decode_data_uri("data:image/png;base64,@@@@").unwrap_err(),
            UploadError::BadDataUri
        ));
        assert!(matches!(
            decode_data_uri("http://example.com/x.png").unwrap_err(),
            UploadError::BadDataUri
        ));
    }
}
