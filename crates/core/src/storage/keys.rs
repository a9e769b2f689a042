//! Object key convention and per-object HTTP metadata.
//!
//! Every blob lives at `{tenant}/{file_name}`. The prefix is the only
//! tenant isolation the storage layer has, so both segments are validated
//! to stay single path components.

use super::error::StorageError;

/// Disposition forced on every download so browsers save instead of render.
pub const ATTACHMENT_DISPOSITION: &str = "attachment";

/// Build the storage key for a tenant's file.
///
/// # Errors
///
/// Returns `InvalidKey` if either segment is empty, `.`/`..`, or contains a
/// path separator or control character.
pub fn object_key(tenant: &str, file_name: &str) -> Result<String, StorageError> {
    validate_segment("tenant", tenant)?;
    validate_segment("file name", file_name)?;
    Ok(format!("{tenant}/{file_name}"))
}

/// Key prefix under which all of a tenant's blobs live.
///
/// # Errors
///
/// Returns `InvalidKey` for an invalid tenant.
pub fn tenant_prefix(tenant: &str) -> Result<String, StorageError> {
    validate_segment("tenant", tenant)?;
    Ok(format!("{tenant}/"))
}

fn validate_segment(what: &str, segment: &str) -> Result<(), StorageError> {
    if segment.is_empty() {
        return Err(StorageError::InvalidKey(format!("{what} is empty")));
    }
    if segment == "." || segment == ".." {
        return Err(StorageError::InvalidKey(format!(
            "{what} '{segment}' is not a valid path component"
        )));
    }
    if segment
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(StorageError::InvalidKey(format!(
            "{what} '{}' contains a path separator or control character",
            segment.escape_default()
        )));
    }
    Ok(())
}

/// Content type inferred from the file extension.
#[must_use]
pub fn content_type_for(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// `Content-Disposition` stored with the object.
#[must_use]
pub fn content_disposition(file_name: &str) -> String {
    format!(
        "{ATTACHMENT_DISPOSITION}; filename=\"{}\"",
        sanitize_filename(file_name)
    )
}

/// Sanitize filename for use inside a header value.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_object_key_format() {
        assert_eq!(object_key("T", "a.txt").unwrap(), "T/a.txt");
        assert_eq!(tenant_prefix("T").unwrap(), "T/");
    }

    #[rstest]
    #[case("", "a.txt")]
    #[case("T", "")]
    #[case("a/b", "a.txt")]
    #[case("T", "../etc/passwd")]
    #[case("T", "dir\\a.txt")]
    #[case("..", "a.txt")]
    #[case("T", ".")]
    #[case("T", "line\nbreak")]
    fn test_object_key_rejects_bad_segments(#[case] tenant: &str, #[case] file_name: &str) {
        let err = object_key(tenant, file_name).unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[rstest]
    #[case("a.txt", "text/plain")]
    #[case("invoice.pdf", "application/pdf")]
    #[case("photo.PNG", "image/png")]
    #[case("archive.unknownext", "application/octet-stream")]
    #[case("no_extension", "application/octet-stream")]
    fn test_content_type_for(#[case] file_name: &str, #[case] expected: &str) {
        assert_eq!(content_type_for(file_name), expected);
    }

    #[test]
    fn test_content_disposition() {
        assert_eq!(
            content_disposition("invoice.pdf"),
            "attachment; filename=\"invoice.pdf\""
        );
        assert_eq!(
            content_disposition("my \"file\".pdf"),
            "attachment; filename=\"my__file_.pdf\""
        );
        assert_eq!(content_disposition("日本語.pdf"), "attachment; filename=\"___.pdf\"");
    }
}
