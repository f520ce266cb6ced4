//! Filename and extension helpers shared by the upload-URL handlers.

use uuid::Uuid;

use crate::error::{ApiError, ErrorCode};

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4"];
pub const EBOOK_EXTENSIONS: &[&str] = &["pdf"];
pub const QUIZ_DOC_EXTENSIONS: &[&str] = &["pdf", "docx"];

/// Lowercased extension without the dot; empty when the filename has none.
pub fn file_extension(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => String::new(),
    }
}

pub fn content_type_for(filename: &str) -> Option<&'static str> {
    match file_extension(filename).as_str() {
        "mp4" => Some("video/mp4"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "epub" => Some("application/epub+zip"),
        "pdf" => Some("application/pdf"),
        "docx" => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        _ => None,
    }
}

/// Trim whitespace, replace inner spaces with underscores, and drop
/// characters that are unsafe in object keys.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .trim()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect()
}

/// Object names are `{uuid}.{ext}` so concurrent uploads never collide.
pub fn generate_unique_filename(filename: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), file_extension(filename))
}

pub fn validate_file_extension(filename: &str, allowed: &[&str]) -> Result<(), ApiError> {
    let extension = file_extension(filename);
    if !allowed.contains(&extension.as_str()) {
        return Err(ApiError::validation(
            ErrorCode::UnsupportedFileType,
            format!("Allowed extensions are: {}.", allowed.join(", ")),
        ));
    }
    Ok(())
}

/// Bytes to megabytes, rounded to two decimal places, for client display.
pub fn bytes_to_mb(size: i64) -> f64 {
    (size as f64 / 1_000_000.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(file_extension("Clip.MP4"), "mp4");
        assert_eq!(file_extension("archive.tar.gz"), "gz");
        assert_eq!(file_extension("noext"), "");
        assert_eq!(file_extension(".hidden"), "");
    }

    #[test]
    fn sanitize_strips_special_characters() {
        assert_eq!(sanitize_filename("  my file (1).png "), "my_file_1.png");
        assert_eq!(sanitize_filename("clip/../../etc.mp4"), "clip....etc.mp4");
    }

    #[test]
    fn unique_filename_keeps_extension() {
        let name = generate_unique_filename("photo.JPG");
        assert!(name.ends_with(".jpg"));
        let stem = name.strip_suffix(".jpg").unwrap();
        assert!(Uuid::parse_str(stem).is_ok());
    }

    #[test]
    fn extension_validation_enforces_allow_list() {
        assert!(validate_file_extension("movie.mp4", VIDEO_EXTENSIONS).is_ok());
        let err = validate_file_extension("movie.avi", VIDEO_EXTENSIONS).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::UnsupportedFileType);
    }

    #[test]
    fn mb_conversion_rounds_to_two_places() {
        assert_eq!(bytes_to_mb(1_500_000), 1.5);
        assert_eq!(bytes_to_mb(1_234_567), 1.23);
    }
}
