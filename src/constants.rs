pub mod auth {
    /// Token validity window.
    pub const TOKEN_TTL_HOURS: i64 = 24;

    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    /// Lockout duration and failure-count window share the same length.
    pub const DEFAULT_LOCKOUT_SECONDS: u64 = 15 * 60;
}

pub mod uploads {
    /// Hard ceiling on a single upload payload.
    pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024 * 1024;

    /// Buffer size used when streaming payloads to disk.
    pub const WRITE_BUFFER_BYTES: usize = 64 * 1024;
}

/// Accepted upload content types. Declared types not on this list are
/// rejected with `UnsupportedMediaType` before any bytes hit disk.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    // Standard images
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "image/bmp",
    "image/tiff",
    // Professional / RAW images
    "image/heic",
    "image/heif",
    "image/x-adobe-dng",
    "image/x-canon-cr2",
    "image/x-canon-cr3",
    "image/x-nikon-nef",
    "image/x-sony-arw",
    "image/x-fuji-raf",
    // Video
    "video/mp4",
    "video/webm",
    "video/quicktime",
    "video/x-matroska",
    "video/x-msvideo",
    "video/mpeg",
    "video/mp2t",
    // Audio
    "audio/mpeg",
    "audio/mp4",
    "audio/aac",
    "audio/ogg",
    "audio/wav",
    "audio/x-wav",
    "audio/flac",
    "audio/x-aiff",
    // Documents
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/vnd.oasis.opendocument.text",
    "application/rtf",
    // Archives and plain content
    "application/zip",
    "application/x-7z-compressed",
    "application/gzip",
    "application/x-tar",
    "text/plain",
    "text/markdown",
    "text/csv",
    "text/x-c",
    "text/x-c++",
    "text/x-java-source",
    "text/x-python",
    "application/json",
    "application/octet-stream",
];
