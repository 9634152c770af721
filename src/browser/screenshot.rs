//! Visible-area capture types.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use image::ImageReader;

use crate::error::{Error, Result};
use crate::identifiers::TabId;

// ============================================================================
// ImageFormat
// ============================================================================

/// Image format for captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// PNG format (lossless, larger file size).
    #[default]
    Png,
    /// JPEG format with quality (0-100).
    Jpeg(u8),
}

impl ImageFormat {
    /// Creates JPEG format with quality (0-100).
    #[inline]
    #[must_use]
    pub fn jpeg(quality: u8) -> Self {
        Self::Jpeg(quality.min(100))
    }

    /// Returns the MIME type for this format.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg(_) => "image/jpeg",
        }
    }

    /// Returns the file extension for this format.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg(_) => "jpg",
        }
    }

    /// Returns the format string for the protocol.
    #[must_use]
    pub fn format_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg(_) => "jpeg",
        }
    }

    /// Returns the quality value if JPEG.
    #[must_use]
    pub fn quality(&self) -> Option<u8> {
        match self {
            Self::Png => None,
            Self::Jpeg(q) => Some(*q),
        }
    }
}

// ============================================================================
// CapturedImage
// ============================================================================

/// A captured visible area, held in memory for one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    /// `data:<mime>;base64,<payload>` URL.
    pub data_url: String,
    /// Tab that was visible when captured.
    pub source_tab: TabId,
    /// Format requested for the capture.
    pub format: ImageFormat,
}

impl CapturedImage {
    /// Wraps a data URL returned by the browser.
    #[must_use]
    pub fn new(data_url: String, source_tab: TabId, format: ImageFormat) -> Self {
        Self {
            data_url,
            source_tab,
            format,
        }
    }

    /// File name used when attaching the image to a page.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("screenshot.{}", self.format.extension())
    }

    /// MIME type declared by the data URL header.
    ///
    /// Falls back to the requested format's type if the header is malformed.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        self.data_url
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(';'))
            .map(|(mime, _)| mime)
            .filter(|mime| !mime.is_empty())
            .unwrap_or_else(|| self.format.mime_type())
    }

    /// Base64 payload after the data URL header.
    fn payload(&self) -> Result<&str> {
        self.data_url
            .split_once(',')
            .map(|(_, payload)| payload)
            .ok_or_else(|| Error::capture("Data URL has no payload"))
    }

    /// Decodes the image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capture`] if the data URL is not valid base64.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        Base64Standard
            .decode(self.payload()?)
            .map_err(|e| Error::capture(format!("Failed to decode base64: {e}")))
    }

    /// Reads the pixel dimensions from the image header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capture`] if the bytes are not a readable image.
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        let bytes = self.bytes()?;
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| Error::capture(e.to_string()))?
            .into_dimensions()
            .map_err(|e| Error::capture(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use image::{ImageBuffer, Rgba};

    /// Encodes a small PNG as a data URL.
    pub(crate) fn png_data_url(width: u32, height: u32) -> String {
        let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        buffer
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        format!("data:image/png;base64,{}", Base64Standard.encode(bytes))
    }

    fn tab() -> TabId {
        TabId::new(1).expect("valid tab id")
    }

    #[test]
    fn test_image_format() {
        assert_eq!(ImageFormat::default(), ImageFormat::Png);
        assert_eq!(ImageFormat::jpeg(150), ImageFormat::Jpeg(100));
        assert_eq!(ImageFormat::Jpeg(80).format_str(), "jpeg");
        assert_eq!(ImageFormat::Png.quality(), None);
    }

    #[test]
    fn test_mime_and_file_name() {
        let image = CapturedImage::new(png_data_url(2, 2), tab(), ImageFormat::Png);
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.file_name(), "screenshot.png");
    }

    #[test]
    fn test_dimensions() {
        let image = CapturedImage::new(png_data_url(7, 3), tab(), ImageFormat::Png);
        assert_eq!(image.dimensions().expect("dimensions"), (7, 3));
    }

    #[test]
    fn test_bad_payload() {
        let image = CapturedImage::new("not a data url".to_string(), tab(), ImageFormat::Png);
        assert!(matches!(image.bytes(), Err(Error::Capture { .. })));
        assert_eq!(image.mime_type(), "image/png");

        let image = CapturedImage::new(
            "data:image/png;base64,!!!".to_string(),
            tab(),
            ImageFormat::Png,
        );
        assert!(image.bytes().is_err());
    }
}
