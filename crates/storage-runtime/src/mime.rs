//! Content-type lookup by file extension.

/// Look up the content type for a blob name by its file extension
///
/// Returns `None` for unknown or absent extensions; callers fall back to
/// their own default in that case.
pub fn content_type_for(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    let content_type = match ext.to_ascii_lowercase().as_str() {
        "json" => "application/json",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "xml" => "application/xml",
        "html" | "htm" => "text/html",
        "bin" => "application/octet-stream",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        _ => return None,
    };
    Some(content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(content_type_for("data.json"), Some("application/json"));
        assert_eq!(content_type_for("notes.txt"), Some("text/plain"));
        assert_eq!(content_type_for("image.JPG"), Some("image/jpeg"));
        assert_eq!(content_type_for("archive.tar.gz"), Some("application/gzip"));
    }

    #[test]
    fn test_unknown_or_missing_extension() {
        assert_eq!(content_type_for("no-extension"), None);
        assert_eq!(content_type_for("weird.xyz"), None);
        assert_eq!(content_type_for(""), None);
    }
}
