//! Image preparation ahead of a vision call.
//!
//! Uploaded bytes are decoded, normalised to RGB(A), shrunk to fit the
//! configured bounding box and re-encoded, so the vision adapter always
//! receives a bounded, well-formed payload.

use std::io::Cursor;

use base64::Engine as _;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use serde::Serialize;

use crate::core::config::defaults::{MAX_IMAGE_DIMENSION, MAX_IMAGE_SIZE_MB, SUPPORTED_IMAGE_TYPES};
use crate::core::config::settings::ImageSettings;
use crate::core::errors::AssistantError;

#[derive(Debug, Clone, Copy)]
pub struct ImageLimits {
    pub max_bytes: u64,
    pub max_dimension: u32,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            max_bytes: MAX_IMAGE_SIZE_MB * 1024 * 1024,
            max_dimension: MAX_IMAGE_DIMENSION,
        }
    }
}

impl From<&ImageSettings> for ImageLimits {
    fn from(settings: &ImageSettings) -> Self {
        Self {
            max_bytes: settings.max_image_size_mb * 1024 * 1024,
            max_dimension: settings.max_dimension,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PreparedImage {
    bytes: Vec<u8>,
    format: ImageFormat,
    width: u32,
    height: u32,
    file_name: Option<String>,
}

impl PreparedImage {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn base64_data(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.base64_data())
    }

    pub fn info(&self) -> ImageInfo {
        ImageInfo {
            format: format_name(self.format).to_string(),
            width: self.width,
            height: self.height,
            size_bytes: self.bytes.len(),
            file_name: self.file_name.clone(),
        }
    }
}

fn format_name(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("png")
}

pub fn prepare_image(
    bytes: &[u8],
    file_name: Option<&str>,
    limits: ImageLimits,
) -> Result<PreparedImage, AssistantError> {
    if bytes.is_empty() {
        return Err(AssistantError::validation("image is empty"));
    }
    if bytes.len() as u64 > limits.max_bytes {
        return Err(AssistantError::validation(format!(
            "image is {} bytes, limit is {} bytes",
            bytes.len(),
            limits.max_bytes
        )));
    }
    if let Some(name) = file_name {
        check_extension(name)?;
    }

    let source_format = image::guess_format(bytes)
        .map_err(|e| AssistantError::validation(format!("Failed to process image: {}", e)))?;
    let decoded = image::load_from_memory_with_format(bytes, source_format)
        .map_err(|e| AssistantError::validation(format!("Failed to process image: {}", e)))?;

    let normalized = match decoded {
        img @ (DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_)) => img,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };

    let max = limits.max_dimension;
    let resized = if normalized.width() > max || normalized.height() > max {
        normalized.resize(max, max, FilterType::Lanczos3)
    } else {
        normalized
    };

    let (target_format, output) = match source_format {
        ImageFormat::Jpeg => (ImageFormat::Jpeg, DynamicImage::ImageRgb8(resized.to_rgb8())),
        ImageFormat::Png | ImageFormat::WebP => (source_format, resized),
        _ => (ImageFormat::Png, resized),
    };

    let mut encoded = Vec::new();
    output
        .write_to(&mut Cursor::new(&mut encoded), target_format)
        .map_err(|e| AssistantError::adapter("image_processor", e))?;

    tracing::debug!(
        format = format_name(target_format),
        width = output.width(),
        height = output.height(),
        bytes = encoded.len(),
        "Prepared image"
    );

    Ok(PreparedImage {
        bytes: encoded,
        format: target_format,
        width: output.width(),
        height: output.height(),
        file_name: file_name.map(|name| name.to_string()),
    })
}

fn check_extension(file_name: &str) -> Result<(), AssistantError> {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if SUPPORTED_IMAGE_TYPES.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(AssistantError::validation(format!(
            "Unsupported image type '{}' (supported: {})",
            extension,
            SUPPORTED_IMAGE_TYPES.join(", ")
        )))
    }
}
