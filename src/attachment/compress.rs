//! Prescription compression: fit a selected file under the transport budget.
//!
//! Non-image files pass through as a data URI if they already fit, and are
//! refused otherwise. Images are decoded, oriented, downscaled so the
//! longer edge is at most `max_dimension`, and JPEG-encoded at the primary
//! quality. If that is still over budget, one fallback encode at the lower
//! quality is returned as-is, whatever its size.

use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, GenericImageView, RgbImage};
use tracing::{debug, info};

use super::orientation::{apply_orientation, read_exif_orientation};
use super::{AttachmentError, CompressionResult, SelectedFile};
use crate::config::CompressionConfig;

const JPEG_MEDIA_TYPE: &str = "image/jpeg";

/// Turns selected files into transport-sized encodings.
#[derive(Debug, Clone, Default)]
pub struct AttachmentCompressor {
    config: CompressionConfig,
}

impl AttachmentCompressor {
    pub fn new(config: CompressionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Compress on the blocking pool. Decode and encode are CPU-bound.
    pub async fn compress(&self, file: SelectedFile) -> Result<CompressionResult, AttachmentError> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || compress_file(&config, &file))
            .await
            .map_err(|e| AttachmentError::TaskFailed(e.to_string()))?
    }
}

/// Synchronous compression pipeline.
pub fn compress_file(
    config: &CompressionConfig,
    file: &SelectedFile,
) -> Result<CompressionResult, AttachmentError> {
    if !file.is_image() {
        return passthrough(config, file);
    }

    // 1. Decode
    let img = image::load_from_memory(&file.bytes)
        .map_err(|e| AttachmentError::DecodeFailure(e.to_string()))?;

    // 2. Fix EXIF orientation
    let img = apply_orientation(img, read_exif_orientation(&file.bytes));
    let (orig_w, orig_h) = img.dimensions();

    // 3. Downscale onto an RGB surface
    let (target_w, target_h) = compute_fit_dimensions(orig_w, orig_h, config.max_dimension);
    let rgb = img.to_rgb8();
    let surface = if (target_w, target_h) == (orig_w, orig_h) {
        rgb
    } else {
        image::imageops::resize(&rgb, target_w, target_h, FilterType::CatmullRom)
    };

    // 4. Primary encode
    let mut quality = config.primary_quality;
    let mut jpeg = encode_jpeg(&surface, quality)?;
    let mut estimate = estimate_transport_size(jpeg.len());

    // 5. Single fallback, returned unconditionally
    if estimate > config.max_transport_bytes {
        debug!(
            estimate,
            budget = config.max_transport_bytes,
            quality = config.fallback_quality,
            "Primary encoding over budget, re-encoding"
        );
        quality = config.fallback_quality;
        jpeg = encode_jpeg(&surface, quality)?;
        estimate = estimate_transport_size(jpeg.len());
    }

    info!(
        original = format!("{orig_w}x{orig_h}"),
        output = format!("{target_w}x{target_h}"),
        input_bytes = file.bytes.len(),
        estimate,
        quality,
        over_budget = estimate > config.max_transport_bytes,
        "Prescription image compressed"
    );

    Ok(CompressionResult {
        encoded_payload: data_uri(JPEG_MEDIA_TYPE, &jpeg),
        estimated_size_bytes: estimate,
        dimensions: Some((target_w, target_h)),
        quality: Some(quality),
    })
}

fn passthrough(
    config: &CompressionConfig,
    file: &SelectedFile,
) -> Result<CompressionResult, AttachmentError> {
    if file.bytes.len() > config.max_transport_bytes {
        return Err(AttachmentError::SizeExceeded {
            size: file.bytes.len(),
            limit: config.max_transport_bytes,
        });
    }

    let media_type = if file.media_type.trim().is_empty() {
        "application/octet-stream"
    } else {
        file.media_type.trim()
    };

    debug!(
        media_type,
        input_bytes = file.bytes.len(),
        "Attachment encoded without compression"
    );

    Ok(CompressionResult {
        encoded_payload: data_uri(media_type, &file.bytes),
        estimated_size_bytes: estimate_transport_size(file.bytes.len()),
        dimensions: None,
        quality: None,
    })
}

// ═══════════════════════════════════════════════════════════
// Pure helper functions
// ═══════════════════════════════════════════════════════════

/// Dimensions with the longer edge capped at `max_dimension`, aspect ratio
/// preserved. Small images are NOT upscaled.
pub fn compute_fit_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }

    let max_dimension = max_dimension.max(1);
    let longest = width.max(height);
    if longest <= max_dimension {
        return (width, height);
    }

    let scale = max_dimension as f64 / longest as f64;
    let new_w = ((width as f64 * scale).round() as u32).clamp(1, max_dimension.min(width));
    let new_h = ((height as f64 * scale).round() as u32).clamp(1, max_dimension.min(height));
    (new_w, new_h)
}

/// Size of `raw_len` bytes once base64-encoded.
pub fn estimate_transport_size(raw_len: usize) -> usize {
    raw_len.div_ceil(3) * 4
}

/// Encode an RGB surface as JPEG at `quality` (1-100).
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, AttachmentError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
        .encode(img.as_raw(), img.width(), img.height(), ColorType::Rgb8)
        .map_err(|e| AttachmentError::Encoding(format!("JPEG encoding failed: {e}")))?;
    Ok(buf)
}

pub fn data_uri(media_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{media_type};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
