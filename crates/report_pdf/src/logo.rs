//! Logo classification, decoding and the bundled default logo.

use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Rgb};
use log::warn;

use crate::error::LogoError;

const DEFAULT_LOGO_WIDTH_PX: u32 = 360;
const DEFAULT_LOGO_HEIGHT_PX: u32 = 120;

/// Image format of a caller-supplied logo, decided once from its declared MIME type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogoFormat {
    /// `image/png`.
    Png,
    /// `image/jpeg` or `image/jpg`.
    Jpeg,
    /// Anything else; the declared type is kept for diagnostics.
    Unsupported(String),
}

impl LogoFormat {
    /// Classifies a MIME type such as `image/png` or `image/jpeg; q=0.9`.
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            _ => Self::Unsupported(mime.to_owned()),
        }
    }
}

/// Raw logo bytes together with their classified format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogoInput {
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
    /// Format classified from the declared MIME type.
    pub format: LogoFormat,
}

impl LogoInput {
    /// Creates an input from bytes and a declared MIME type.
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: &str) -> Self {
        Self {
            bytes: bytes.into(),
            format: LogoFormat::from_mime(mime_type),
        }
    }
}

/// A decoded logo ready to be placed on every page.
#[derive(Clone, Debug)]
pub struct Logo {
    image: DynamicImage,
    is_default: bool,
}

impl Logo {
    /// Decodes a caller-supplied logo.
    pub fn decode(input: &LogoInput) -> Result<Self, LogoError> {
        let format = match &input.format {
            LogoFormat::Png => ImageFormat::Png,
            LogoFormat::Jpeg => ImageFormat::Jpeg,
            LogoFormat::Unsupported(mime) => {
                return Err(LogoError::UnsupportedLogoFormat(mime.clone()))
            }
        };

        let decoded = image::load_from_memory_with_format(&input.bytes, format)?;
        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(LogoError::Empty);
        }

        // genpdf refuses images with an alpha channel.
        Ok(Self {
            image: DynamicImage::ImageRgb8(decoded.to_rgb8()),
            is_default: false,
        })
    }

    /// Returns the decoded caller logo, or the default logo when none is given or it is unusable.
    pub fn resolve(input: Option<&LogoInput>) -> Self {
        match input {
            None => Self::default_logo(),
            Some(input) => Self::decode(input).unwrap_or_else(|err| {
                warn!("Falling back to the default logo: {}", err);
                Self::default_logo()
            }),
        }
    }

    /// The bundled default logo: a horizontal navy-to-teal band with a light accent stripe.
    pub fn default_logo() -> Self {
        let width_f = (DEFAULT_LOGO_WIDTH_PX - 1) as f32;
        let buffer = ImageBuffer::from_fn(DEFAULT_LOGO_WIDTH_PX, DEFAULT_LOGO_HEIGHT_PX, |x, y| {
            let mix = x as f32 / width_f;
            let start = [24.0_f32, 46.0, 92.0];
            let end = [32.0_f32, 148.0, 140.0];
            let mut channels = [0u8; 3];
            for (index, channel) in channels.iter_mut().enumerate() {
                let value = start[index] + (end[index] - start[index]) * mix;
                *channel = value.round().clamp(0.0, 255.0) as u8;
            }
            if (52..68).contains(&y) {
                for channel in &mut channels {
                    *channel = channel.saturating_add(90);
                }
            }
            Rgb(channels)
        });

        Self {
            image: DynamicImage::ImageRgb8(buffer),
            is_default: true,
        }
    }

    /// Returns whether this is the bundled default logo.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// Returns the decoded image.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Pixel dimensions of the image.
    pub fn pixel_size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Display height for the given display width, keeping the native aspect ratio.
    pub fn display_height(&self, display_width: f64) -> f64 {
        let (width, height) = self.pixel_size();
        display_width * f64::from(height) / f64::from(width)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::ImageOutputFormat;

    use super::*;

    fn encoded(format: ImageOutputFormat) -> Vec<u8> {
        let buffer = ImageBuffer::from_fn(40, 10, |x, _| Rgb([x as u8 * 5, 80, 160]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(buffer)
            .write_to(&mut Cursor::new(&mut bytes), format)
            .expect("encode test image");
        bytes
    }

    #[test]
    fn classifies_mime_types() {
        assert_eq!(LogoFormat::from_mime("image/png"), LogoFormat::Png);
        assert_eq!(LogoFormat::from_mime("IMAGE/JPEG"), LogoFormat::Jpeg);
        assert_eq!(LogoFormat::from_mime("image/jpg; q=1"), LogoFormat::Jpeg);
        assert_eq!(
            LogoFormat::from_mime("image/bmp"),
            LogoFormat::Unsupported("image/bmp".to_owned())
        );
    }

    #[test]
    fn decodes_png_and_keeps_aspect_ratio() {
        let logo = Logo::decode(&LogoInput::new(encoded(ImageOutputFormat::Png), "image/png"))
            .expect("decode png");
        assert!(!logo.is_default());
        assert_eq!(logo.pixel_size(), (40, 10));
        assert_eq!(logo.display_height(120.0), 30.0);
    }

    #[test]
    fn decodes_jpeg() {
        let bytes = encoded(ImageOutputFormat::Jpeg(90));
        let logo = Logo::decode(&LogoInput::new(bytes, "image/jpeg")).expect("decode jpeg");
        assert_eq!(logo.pixel_size(), (40, 10));
    }

    #[test]
    fn unsupported_format_is_reported() {
        let err = Logo::decode(&LogoInput::new(vec![0x42, 0x4d], "image/bmp")).unwrap_err();
        assert!(matches!(err, LogoError::UnsupportedLogoFormat(mime) if mime == "image/bmp"));
    }

    #[test]
    fn resolve_falls_back_to_default() {
        assert!(Logo::resolve(None).is_default());
        let bmp = LogoInput::new(vec![0x42, 0x4d, 0x00], "image/bmp");
        assert!(Logo::resolve(Some(&bmp)).is_default());
        let broken_png = LogoInput::new(vec![1, 2, 3], "image/png");
        assert!(Logo::resolve(Some(&broken_png)).is_default());
    }

    #[test]
    fn default_logo_is_three_to_one() {
        let logo = Logo::default_logo();
        assert_eq!(logo.display_height(120.0), 40.0);
    }
}
