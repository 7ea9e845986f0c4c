//! Screenshot upload validation
//!
//! Checks the declared MIME type and the byte size only. The bytes are not
//! sniffed: a file declared as `image/png` is trusted to be one.

use thiserror::Error;

use crate::models::FileDescriptor;

/// Uploads of this many bytes or more are refused (10 MiB)
///
/// Exclusive bound: a file of exactly 10 MiB is rejected, matching the
/// "less than 10MB" message rather than a `size > 10 MiB` check.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Declared MIME types accepted for screenshots
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Upload validation failures, displayed verbatim to the visitor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please upload a valid image file (JPG, PNG, or WebP)")]
    UnsupportedType { declared_mime: String },

    #[error("File size must be less than 10MB")]
    TooLarge { size_bytes: u64 },
}

/// Validate an upload's declared type, then its size
pub fn validate_image_file(file: &FileDescriptor) -> Result<(), ValidationError> {
    let mime = normalize_mime(&file.declared_mime);
    if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(ValidationError::UnsupportedType {
            declared_mime: file.declared_mime.clone(),
        });
    }

    if file.size_bytes >= MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge {
            size_bytes: file.size_bytes,
        });
    }

    Ok(())
}

/// Lowercase essence of a MIME type (parameters such as `; charset=` dropped)
fn normalize_mime(mime: &str) -> String {
    mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(mime: &str, size: u64) -> FileDescriptor {
        FileDescriptor {
            declared_mime: mime.to_string(),
            size_bytes: size,
        }
    }

    #[test]
    fn accepts_every_allowed_type() {
        for mime in ALLOWED_MIME_TYPES {
            assert_eq!(validate_image_file(&file(mime, 1024)), Ok(()), "{}", mime);
        }
    }

    #[test]
    fn rejects_other_types_with_type_message() {
        for mime in ["image/gif", "application/pdf", "text/plain", "", "image/svg+xml"] {
            let err = validate_image_file(&file(mime, 1024)).unwrap_err();
            assert!(matches!(err, ValidationError::UnsupportedType { .. }));
            assert_eq!(
                err.to_string(),
                "Please upload a valid image file (JPG, PNG, or WebP)"
            );
        }
    }

    #[test]
    fn rejects_ten_mebibytes_and_above_with_size_message() {
        for size in [MAX_UPLOAD_BYTES, MAX_UPLOAD_BYTES + 1, 50 * 1024 * 1024] {
            let err = validate_image_file(&file("image/png", size)).unwrap_err();
            assert_eq!(err, ValidationError::TooLarge { size_bytes: size });
            assert_eq!(err.to_string(), "File size must be less than 10MB");
        }
    }

    #[test]
    fn accepts_just_under_the_limit() {
        assert!(validate_image_file(&file("image/webp", MAX_UPLOAD_BYTES - 1)).is_ok());
    }

    #[test]
    fn type_is_checked_before_size() {
        let err = validate_image_file(&file("image/gif", MAX_UPLOAD_BYTES * 2)).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedType { .. }));
    }

    #[test]
    fn mime_comparison_ignores_case_and_parameters() {
        assert!(validate_image_file(&file("IMAGE/PNG", 10)).is_ok());
        assert!(validate_image_file(&file("image/jpeg; q=0.9", 10)).is_ok());
    }
}
