use std::io::Cursor;

use anyhow::{Context as _, anyhow};
use image::{DynamicImage, ImageFormat};

pub use toolbelt_core::Result;

/// A decoded image together with the format it was decoded from.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub image: DynamicImage,
    /// `None` for images built in memory, which have to be encoded with an
    /// explicit format.
    pub native_format: Option<ImageFormat>,
}

impl DecodedImage {
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self {
            image,
            native_format: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EncodeOptions {
    /// Output format. Defaults to the image's native format.
    pub format: Option<ImageFormat>,
}

impl EncodeOptions {
    pub fn with_format(format: ImageFormat) -> Self {
        Self {
            format: Some(format),
        }
    }
}

pub fn bytes_to_image(bytes: &[u8]) -> Result<DecodedImage> {
    let format = image::guess_format(bytes)?;
    let image = image::load_from_memory_with_format(bytes, format)?;
    tracing::debug!(
        ?format,
        width = image.width(),
        height = image.height(),
        "Decoded image."
    );
    Ok(DecodedImage {
        image,
        native_format: Some(format),
    })
}

pub fn image_to_bytes(image: &DecodedImage, options: &EncodeOptions) -> Result<Vec<u8>> {
    let format = options.format.or(image.native_format).ok_or_else(|| {
        anyhow!("Image has no native format; an explicit output format is required.")
    })?;
    let mut bytes = Vec::new();
    image.image.write_to(&mut Cursor::new(&mut bytes), format)?;
    tracing::debug!(?format, len = bytes.len(), "Encoded image.");
    Ok(bytes)
}

/// Resolves a format from a name or file extension such as `png` or `jpg`.
pub fn format_from_name(name: &str) -> Result<ImageFormat> {
    let name = name.trim().trim_start_matches('.');
    ImageFormat::from_extension(name)
        .or_else(|| ImageFormat::from_mime_type(name))
        .with_context(|| format!("Unknown image format `{name}`"))
}
