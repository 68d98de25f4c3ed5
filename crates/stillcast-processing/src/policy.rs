//! Source acceptance policy.
//!
//! A source is accepted only if its declared content type maps to an allowed
//! image type, or, when the content type is absent or generic, its path
//! extension does. A declared content type that maps to a disallowed type
//! rejects the source regardless of extension.

use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("Disallowed content type: {0} (allowed: image/jpeg, image/png)")]
    DisallowedContentType(String),

    #[error("Disallowed file extension: {0:?} (allowed: jpg, jpeg, png)")]
    DisallowedExtension(Option<String>),
}

/// The image formats the service accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
        }
    }

    fn from_content_type(normalized: &str) -> Option<ImageKind> {
        match normalized {
            "image/jpeg" | "image/jpg" => Some(ImageKind::Jpeg),
            "image/png" => Some(ImageKind::Png),
            _ => None,
        }
    }

    fn from_extension(extension: &str) -> Option<ImageKind> {
        match extension {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            _ => None,
        }
    }
}

/// Normalize a MIME type by stripping parameters
/// (e.g. "image/jpeg; charset=utf-8" -> "image/jpeg").
fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase()
}

fn path_extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// A declared type that carries no format information; falls through to the
/// extension check rather than rejecting outright.
fn is_generic_content_type(normalized: &str) -> bool {
    normalized.is_empty() || normalized == "application/octet-stream"
}

/// Classify a fetched source from its declared content type and URL path.
pub fn classify_source(content_type: Option<&str>, path: &str) -> Result<ImageKind, PolicyError> {
    if let Some(raw) = content_type {
        let normalized = normalize_mime_type(raw);
        if !is_generic_content_type(&normalized) {
            return ImageKind::from_content_type(&normalized)
                .ok_or(PolicyError::DisallowedContentType(normalized));
        }
    }

    classify_upload(path)
}

/// Classify an uploaded file from its declared filename alone.
pub fn classify_upload(filename: &str) -> Result<ImageKind, PolicyError> {
    let extension = path_extension(filename);
    extension
        .as_deref()
        .and_then(ImageKind::from_extension)
        .ok_or(PolicyError::DisallowedExtension(extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_content_types() {
        assert_eq!(
            classify_source(Some("image/jpeg"), "/photo").unwrap(),
            ImageKind::Jpeg
        );
        assert_eq!(
            classify_source(Some("image/png"), "/photo").unwrap(),
            ImageKind::Png
        );
    }

    #[test]
    fn strips_mime_parameters_and_case() {
        assert_eq!(
            classify_source(Some("IMAGE/JPEG; charset=utf-8"), "/photo").unwrap(),
            ImageKind::Jpeg
        );
    }

    #[test]
    fn disallowed_content_type_rejects_despite_extension() {
        let err = classify_source(Some("text/html"), "/photo.jpg").unwrap_err();
        assert!(matches!(err, PolicyError::DisallowedContentType(_)));

        let err = classify_source(Some("image/gif"), "/photo.png").unwrap_err();
        assert!(matches!(err, PolicyError::DisallowedContentType(_)));
    }

    #[test]
    fn absent_content_type_falls_back_to_extension() {
        assert_eq!(
            classify_source(None, "/images/photo.JPG").unwrap(),
            ImageKind::Jpeg
        );
        assert_eq!(
            classify_source(None, "/images/photo.jpeg").unwrap(),
            ImageKind::Jpeg
        );
        assert_eq!(
            classify_source(None, "/images/photo.png").unwrap(),
            ImageKind::Png
        );
    }

    #[test]
    fn generic_content_type_falls_back_to_extension() {
        assert_eq!(
            classify_source(Some("application/octet-stream"), "/p/photo.png").unwrap(),
            ImageKind::Png
        );
    }

    #[test]
    fn rejects_when_nothing_recognizable() {
        let err = classify_source(None, "/page").unwrap_err();
        assert!(matches!(err, PolicyError::DisallowedExtension(None)));

        let err = classify_source(None, "/download/archive.zip").unwrap_err();
        assert!(matches!(err, PolicyError::DisallowedExtension(Some(_))));
    }

    #[test]
    fn upload_rejects_disallowed_extension() {
        assert!(classify_upload("photo.gif").is_err());
        assert!(classify_upload("photo").is_err());
        assert_eq!(classify_upload("photo.png").unwrap(), ImageKind::Png);
    }
}
