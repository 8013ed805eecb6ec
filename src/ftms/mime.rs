use std::path::Path;

/// Content type recorded for extensions missing from the table.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// MIME types accepted by the upload endpoint, checked against the type the
/// client declared for the multipart part.
pub const ALLOWED_UPLOAD_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/tiff",
    "text/plain",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

pub fn is_allowed_upload(declared: &str) -> bool {
    ALLOWED_UPLOAD_TYPES.contains(&declared)
}

/// Guess the content type from the filename extension.
pub fn guess_mime_type(filename: &str) -> &'static str {
    let ext = extension_of(filename).to_lowercase();
    match ext.as_str() {
        ".pdf" => "application/pdf",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".bmp" => "image/bmp",
        ".tiff" => "image/tiff",
        ".txt" => "text/plain",
        ".doc" => "application/msword",
        ".docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".xls" => "application/vnd.ms-excel",
        ".xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => OCTET_STREAM,
    }
}

/// Extension including the leading dot, or an empty string.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_map_case_insensitively() {
        assert_eq!(guess_mime_type("permit.PDF"), "application/pdf");
        assert_eq!(guess_mime_type("scan.JpEg"), "image/jpeg");
        assert_eq!(guess_mime_type("notes.txt"), "text/plain");
        assert_eq!(
            guess_mime_type("sheet.xlsx"),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
    }

    #[test]
    fn unknown_or_missing_extension_is_octet_stream() {
        assert_eq!(guess_mime_type("archive.zip"), OCTET_STREAM);
        assert_eq!(guess_mime_type("README"), OCTET_STREAM);
        assert_eq!(guess_mime_type(".hidden"), OCTET_STREAM);
    }

    #[test]
    fn extension_keeps_original_case() {
        assert_eq!(extension_of("a/b/Report.Pdf"), ".Pdf");
        assert_eq!(extension_of("noext"), "");
    }

    #[test]
    fn allow_list_rejects_archives() {
        assert!(is_allowed_upload("image/png"));
        assert!(is_allowed_upload("application/msword"));
        assert!(!is_allowed_upload("application/zip"));
        assert!(!is_allowed_upload("text/html"));
    }
}
