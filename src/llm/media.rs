use std::io::Cursor;

use image::ImageReader;
use tracing::debug;

use crate::llm::types::SourceImage;
use crate::studio::error::StudioError;

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    if data.len() > 12 {
        let ftyp = &data[4..12];
        if ftyp.starts_with(b"ftyp") {
            let brand = &ftyp[4..8];
            if brand == b"heic" || brand == b"heif" || brand == b"hevc" {
                return Some("image/heic".to_string());
            }
        }
    }

    infer::get(data).map(|kind| kind.mime_type().to_string())
}

pub fn normalize_gemini_mime_type(mime_type: &str) -> String {
    let lowered = mime_type.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        "image/x-png" => "image/png".to_string(),
        _ => lowered,
    }
}

pub fn gemini_supports_image_mime(mime_type: &str) -> bool {
    matches!(
        mime_type,
        "image/png" | "image/jpeg" | "image/webp" | "image/heic" | "image/heif"
    )
}

pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match normalize_gemini_mime_type(mime_type).as_str() {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/heic" | "image/heif" => "heic",
        _ => "png",
    }
}

/// Pixel dimensions for the formats the `image` crate was built with.
pub fn probe_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Validates uploaded bytes and tags them with a MIME type Gemini accepts.
pub fn prepare_source_image(bytes: Vec<u8>) -> Result<SourceImage, StudioError> {
    if bytes.is_empty() {
        return Err(StudioError::InvalidSourceImage("the file is empty".to_string()));
    }

    let detected = detect_mime_type(&bytes).ok_or_else(|| {
        StudioError::InvalidSourceImage("the file type could not be recognized".to_string())
    })?;
    let mime_type = normalize_gemini_mime_type(&detected);
    if !gemini_supports_image_mime(&mime_type) {
        return Err(StudioError::InvalidSourceImage(format!(
            "{mime_type} is not a supported photo format"
        )));
    }

    match probe_dimensions(&bytes) {
        Some((width, height)) => debug!(
            "Source image accepted: mime={} bytes={} size={}x{}",
            mime_type,
            bytes.len(),
            width,
            height
        ),
        None => debug!(
            "Source image accepted: mime={} bytes={} (dimensions unavailable)",
            mime_type,
            bytes.len()
        ),
    }

    Ok(SourceImage { bytes, mime_type })
}
