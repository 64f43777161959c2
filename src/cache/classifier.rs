//! Static resource classification.
//!
//! A response is a static asset when either the request path carries a known
//! asset extension or the content type names an asset MIME family. Either
//! signal alone is enough.

/// Asset file extensions, lowercase, without the dot.
const STATIC_EXTENSIONS: &[&str] = &[
    // images
    "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "bmp", "avif", "tif", "tiff",
    // fonts
    "woff", "woff2", "ttf", "otf", "eot",
    // styles & scripts
    "css", "js", "mjs", "map",
    // audio & video
    "mp3", "mp4", "webm", "ogg", "ogv", "wav", "flac", "m4a", "aac", "avi", "mov", "mkv",
    // archives & documents
    "zip", "gz", "tgz", "tar", "rar", "7z", "bz2", "xz", "pdf", "doc", "docx", "xls", "xlsx",
    "ppt", "pptx",
];

/// MIME fragments matched by substring against the lowercased content type.
const STATIC_CONTENT_TYPES: &[&str] = &[
    "image/",
    "font/",
    "application/font-",
    "application/x-font-",
    "text/css",
    "application/javascript",
    "text/javascript",
    "video/",
    "audio/",
    "application/pdf",
    "application/zip",
    "application/gzip",
    "application/x-gzip",
    "application/x-tar",
    "application/x-rar-compressed",
    "application/vnd.rar",
    "application/x-7z-compressed",
];

/// Returns true if `path` or `content_type` denotes a static asset.
pub fn is_static(path: Option<&str>, content_type: Option<&str>) -> bool {
    path.is_some_and(has_static_extension) || content_type.is_some_and(has_static_content_type)
}

fn has_static_extension(path: &str) -> bool {
    // Query and fragment never contribute to the extension.
    let path = path.split(['?', '#']).next().unwrap_or_default();
    match path.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            STATIC_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}

fn has_static_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    STATIC_CONTENT_TYPES
        .iter()
        .any(|prefix| content_type.contains(prefix))
}
