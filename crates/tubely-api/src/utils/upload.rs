//! Common utilities for file upload handlers

use tubely_core::AppError;

pub const VIDEO_MP4: &str = "video/mp4";

/// Parse a Content-Type header value down to its lowercase `type/subtype`.
/// Parameters such as `; codecs=...` are ignored.
pub fn media_type_essence(content_type: Option<&str>) -> Result<String, AppError> {
    let raw = content_type
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::UnsupportedMediaType("Missing content type".to_string()))?;

    let parsed: mime::Mime = raw
        .parse()
        .map_err(|_| AppError::UnsupportedMediaType(format!("Invalid content type: {}", raw)))?;

    Ok(parsed.essence_str().to_ascii_lowercase())
}

/// Only MP4 is accepted for video uploads.
pub fn ensure_video_mp4(content_type: Option<&str>) -> Result<(), AppError> {
    let essence = media_type_essence(content_type)?;
    if essence != VIDEO_MP4 {
        return Err(AppError::UnsupportedMediaType(format!(
            "Unsupported video type '{}', expected {}",
            essence, VIDEO_MP4
        )));
    }
    Ok(())
}

/// File extension for an accepted thumbnail type.
pub fn thumbnail_extension(content_type: Option<&str>) -> Result<&'static str, AppError> {
    let essence = media_type_essence(content_type)?;
    if essence == mime::IMAGE_JPEG.essence_str() {
        Ok("jpg")
    } else if essence == mime::IMAGE_PNG.essence_str() {
        Ok("png")
    } else {
        Err(AppError::UnsupportedMediaType(format!(
            "Unsupported thumbnail type '{}', expected image/jpeg or image/png",
            essence
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mp4_with_parameters_is_accepted() {
        assert!(ensure_video_mp4(Some("video/mp4")).is_ok());
        assert!(ensure_video_mp4(Some("Video/MP4")).is_ok());
        assert!(ensure_video_mp4(Some("video/mp4; codecs=\"avc1.42E01E\"")).is_ok());
    }

    #[test]
    fn test_other_video_types_are_rejected() {
        for ct in ["video/avi", "video/quicktime", "application/octet-stream"] {
            assert!(
                matches!(
                    ensure_video_mp4(Some(ct)),
                    Err(AppError::UnsupportedMediaType(_))
                ),
                "{} should be rejected",
                ct
            );
        }
    }

    #[test]
    fn test_missing_or_garbage_content_type_is_unsupported() {
        assert!(matches!(
            ensure_video_mp4(None),
            Err(AppError::UnsupportedMediaType(_))
        ));
        assert!(matches!(
            ensure_video_mp4(Some("not a mime")),
            Err(AppError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn test_thumbnail_extensions() {
        assert_eq!(thumbnail_extension(Some("image/jpeg")).unwrap(), "jpg");
        assert_eq!(thumbnail_extension(Some("image/png")).unwrap(), "png");
        assert!(matches!(
            thumbnail_extension(Some("image/gif")),
            Err(AppError::UnsupportedMediaType(_))
        ));
    }
}
