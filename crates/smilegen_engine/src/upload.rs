use std::fs;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use smilegen_logging::{smile_debug, smile_info};

use crate::{ClientError, FailureKind};

const MIB: u64 = 1024 * 1024;
const OPTIMIZE_QUALITY: u8 = 90;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_bytes: u64,
    pub allowed_types: Vec<String>,
    /// Largest side the service accepts, in pixels.
    pub max_resolution: u32,
    /// Bounding box large uploads are scaled into before sending.
    pub optimize_max_side: u32,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: 5 * MIB,
            allowed_types: vec![
                "image/jpeg".to_string(),
                "image/jpg".to_string(),
                "image/png".to_string(),
            ],
            max_resolution: 4096,
            optimize_max_side: 2048,
        }
    }
}

impl UploadLimits {
    /// Uploads above 80% of the size limit are re-encoded first.
    pub fn wants_optimization(&self, size: u64) -> bool {
        size.saturating_mul(5) > self.max_bytes.saturating_mul(4)
    }

    fn is_type_allowed(&self, mime: &str) -> bool {
        let essence = mime.split(';').next().unwrap_or(mime).trim();
        self.allowed_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(essence))
    }
}

/// Image payload as picked by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Reads a file and infers its MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, ClientError> {
        let bytes = fs::read(path).map_err(|err| {
            ClientError::new(
                FailureKind::Validation,
                format!("cannot read {}: {err}", path.display()),
            )
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let mime = mime_from_extension(path);
        Ok(Self::new(file_name, mime, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Size change made by [`optimize_upload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Optimization {
    pub original_size: u64,
    pub optimized_size: u64,
    pub width: u32,
    pub height: u32,
}

/// Shrinks a large upload: scaled under the resolution cap and the optimize box,
/// then re-encoded as JPEG. Small uploads, unsupported types and re-encodes that
/// would not save space are passed through untouched.
pub fn optimize_upload(
    upload: ImageUpload,
    limits: &UploadLimits,
) -> Result<(ImageUpload, Option<Optimization>), ClientError> {
    if !limits.wants_optimization(upload.size()) || !limits.is_type_allowed(&upload.mime) {
        return Ok((upload, None));
    }

    let decoded = image::load_from_memory(&upload.bytes).map_err(|err| {
        ClientError::new(
            FailureKind::Validation,
            format!("cannot decode {}: {err}", upload.file_name),
        )
    })?;
    let (width, height) = fit_within(
        decoded.width(),
        decoded.height(),
        limits.max_resolution,
        limits.max_resolution,
    );
    let (width, height) = fit_within(
        width,
        height,
        limits.optimize_max_side,
        limits.optimize_max_side,
    );
    let resized = if (width, height) == (decoded.width(), decoded.height()) {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::Lanczos3)
    };

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, OPTIMIZE_QUALITY)
        .encode_image(&resized.to_rgb8())
        .map_err(|err| ClientError::new(FailureKind::Validation, err.to_string()))?;

    let optimized_size = bytes.len() as u64;
    if optimized_size >= upload.size() {
        smile_debug!(
            "Re-encoding {} would not shrink it ({} -> {} bytes)",
            upload.file_name,
            upload.size(),
            optimized_size
        );
        return Ok((upload, None));
    }

    let optimization = Optimization {
        original_size: upload.size(),
        optimized_size,
        width,
        height,
    };
    smile_info!(
        "Optimized {} to {}x{}: {} -> {} bytes",
        upload.file_name,
        width,
        height,
        optimization.original_size,
        optimized_size
    );
    Ok((
        ImageUpload::new(upload.file_name, "image/jpeg", bytes),
        Some(optimization),
    ))
}

/// Largest size with the same aspect ratio that fits in `max_width` x `max_height`.
fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let (w, h) = (u64::from(width), u64::from(height));
    let (max_w, max_h) = (u64::from(max_width), u64::from(max_height));
    let scaled =
        |side: u64, target: u64, base: u64| ((side * target + base / 2) / base).max(1) as u32;
    if w * max_h >= h * max_w {
        (max_width, scaled(h, max_w, w))
    } else {
        (scaled(w, max_h, h), max_height)
    }
}

/// Rejects uploads the service would refuse, before any network traffic.
pub fn validate_upload(upload: &ImageUpload, limits: &UploadLimits) -> Result<(), ClientError> {
    if upload.size() > limits.max_bytes {
        return Err(ClientError::new(
            FailureKind::Validation,
            format!("Image size exceeds {} limit.", describe_bytes(limits.max_bytes)),
        ));
    }
    if !limits.is_type_allowed(&upload.mime) {
        return Err(ClientError::new(
            FailureKind::Validation,
            format!(
                "Unsupported image format {}. Please use {}.",
                upload.mime,
                limits.allowed_types.join(", ")
            ),
        ));
    }
    Ok(())
}

fn describe_bytes(bytes: u64) -> String {
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_parameters_are_ignored() {
        let limits = UploadLimits::default();
        assert!(limits.is_type_allowed("image/PNG; charset=binary"));
        assert!(!limits.is_type_allowed("image/webp"));
    }

    #[test]
    fn oversize_message_names_the_limit() {
        let upload = ImageUpload::new("big.jpg", "image/jpeg", vec![0; 11]);
        let limits = UploadLimits {
            max_bytes: 10,
            ..UploadLimits::default()
        };
        let err = validate_upload(&upload, &limits).unwrap_err();
        assert_eq!(err.kind, FailureKind::Validation);
        assert_eq!(err.message, "Image size exceeds 10 bytes limit.");
    }

    #[test]
    fn optimization_threshold_is_eighty_percent() {
        let limits = UploadLimits {
            max_bytes: 100,
            ..UploadLimits::default()
        };
        assert!(!limits.wants_optimization(80));
        assert!(limits.wants_optimization(81));
    }

    #[test]
    fn fit_within_keeps_aspect_ratio() {
        assert_eq!(fit_within(800, 600, 2048, 2048), (800, 600));
        assert_eq!(fit_within(8192, 4096, 4096, 4096), (4096, 2048));
        assert_eq!(fit_within(1000, 3000, 2048, 2048), (683, 2048));
        assert_eq!(fit_within(5000, 1, 100, 100), (100, 1));
    }

    #[test]
    fn extension_picks_mime() {
        assert_eq!(mime_from_extension(Path::new("a/b/face.JPG")), "image/jpeg");
        assert_eq!(mime_from_extension(Path::new("face")), "application/octet-stream");
    }
}
