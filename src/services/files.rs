//! Upload storage gateway.
//!
//! Payloads stream to a temp file inside the uploads directory and are
//! published with a rename, so a crash mid-upload never leaves a partial
//! file visible. The declared content type is checked against the
//! allow-list before any bytes hit disk, and the first chunk is sniffed
//! for magic bytes that contradict the declaration.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::constants::{ALLOWED_MIME_TYPES, uploads};

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("payload exceeds the {limit} byte upload ceiling")]
    PayloadTooLarge { limit: u64 },

    #[error("content type '{declared}' is not accepted")]
    UnsupportedMediaType { declared: String },

    #[error("file not found")]
    NotFound,

    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<std::io::Error> for FileError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Result of a successful store: the server-assigned name the bytes live
/// under, and the measured payload size.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub storage_name: String,
    pub size_bytes: i64,
}

#[derive(Clone)]
pub struct FileService {
    uploads_dir: PathBuf,
    max_bytes: u64,
}

impl FileService {
    pub async fn new(uploads_dir: impl Into<PathBuf>, max_bytes: u64) -> Result<Self, FileError> {
        let uploads_dir = uploads_dir.into();
        fs::create_dir_all(uploads_dir.join(".tmp")).await?;
        Ok(Self {
            uploads_dir,
            max_bytes,
        })
    }

    /// Stream a payload to disk and publish it under a fresh storage name.
    ///
    /// The temp file is removed on every failure path; the final rename is
    /// the only step that makes the upload visible.
    pub async fn store<S, E>(
        &self,
        original_name: &str,
        declared_mime: &str,
        mut body: S,
    ) -> Result<StoredUpload, FileError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Display,
    {
        if !ALLOWED_MIME_TYPES.contains(&declared_mime) {
            return Err(FileError::UnsupportedMediaType {
                declared: declared_mime.to_string(),
            });
        }

        let storage_name = Self::fresh_storage_name(original_name);
        let tmp_path = self.uploads_dir.join(".tmp").join(&storage_name);
        let final_path = self.uploads_dir.join(&storage_name);

        let result = self
            .write_stream(&tmp_path, declared_mime, &mut body)
            .await;

        let size_bytes = match result {
            Ok(size) => size,
            Err(e) => {
                fs::remove_file(&tmp_path).await.ok();
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&tmp_path, &final_path).await {
            fs::remove_file(&tmp_path).await.ok();
            return Err(e.into());
        }

        debug!(
            storage_name,
            size_bytes, declared_mime, "Published uploaded file"
        );

        Ok(StoredUpload {
            storage_name,
            size_bytes,
        })
    }

    async fn write_stream<S, E>(
        &self,
        tmp_path: &Path,
        declared_mime: &str,
        body: &mut S,
    ) -> Result<i64, FileError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Display,
    {
        let file = fs::File::create(tmp_path).await?;
        let mut writer = tokio::io::BufWriter::with_capacity(uploads::WRITE_BUFFER_BYTES, file);

        let mut written: u64 = 0;
        let mut first_chunk = true;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| FileError::Storage(format!("body read failed: {e}")))?;

            if first_chunk && !chunk.is_empty() {
                first_chunk = false;
                if let Some(compatible) = sniff_compatible_types(&chunk)
                    && !compatible.contains(&declared_mime)
                    && declared_mime != "application/octet-stream"
                {
                    warn!(
                        declared = declared_mime,
                        detected = compatible[0],
                        "Upload rejected: magic bytes contradict declared type"
                    );
                    return Err(FileError::UnsupportedMediaType {
                        declared: declared_mime.to_string(),
                    });
                }
            }

            written += chunk.len() as u64;
            if written > self.max_bytes {
                return Err(FileError::PayloadTooLarge {
                    limit: self.max_bytes,
                });
            }

            writer.write_all(&chunk).await?;
        }

        writer.flush().await?;
        writer.into_inner().sync_all().await?;

        Ok(i64::try_from(written).unwrap_or(i64::MAX))
    }

    /// Absolute path of a published upload; `NotFound` if the bytes are gone.
    pub async fn path_for(&self, storage_name: &str) -> Result<PathBuf, FileError> {
        let path = self.uploads_dir.join(storage_name);
        if fs::try_exists(&path).await? {
            Ok(path)
        } else {
            Err(FileError::NotFound)
        }
    }

    /// Remove published bytes. Deleting a name that no longer exists is
    /// `NotFound`, not success.
    pub async fn delete(&self, storage_name: &str) -> Result<(), FileError> {
        let path = self.uploads_dir.join(storage_name);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FileError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Server-assigned name: a UUID plus the original extension, so the
    /// on-disk name can never collide or carry path components.
    fn fresh_storage_name(original_name: &str) -> String {
        let id = uuid::Uuid::new_v4();
        match Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            Some(ext) => format!("{id}.{}", ext.to_ascii_lowercase()),
            None => id.to_string(),
        }
    }
}

/// ISO base media file format. The `ftyp` box opens mp4 video, QuickTime
/// movies, m4a audio, HEIF stills, and Canon CR3 raws alike; the brand
/// bytes are too varied to be worth enumerating.
const BMFF_FAMILY: &[&str] = &[
    "video/mp4",
    "video/quicktime",
    "audio/mp4",
    "image/heic",
    "image/heif",
    "image/x-canon-cr3",
];

/// An EBML header opens both matroska and webm.
const EBML_FAMILY: &[&str] = &["video/webm", "video/x-matroska"];

/// Identify a handful of unmistakable signatures from leading magic bytes
/// and return the declared types they are compatible with. Container
/// signatures map to every format sharing the envelope. Returning `None`
/// means "no opinion", not "unknown format".
fn sniff_compatible_types(head: &[u8]) -> Option<&'static [&'static str]> {
    if head.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(&["image/png"]);
    }
    if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(&["image/jpeg"]);
    }
    if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
        return Some(&["image/gif"]);
    }
    if head.len() >= 12 && &head[0..4] == b"RIFF" && &head[8..12] == b"WEBP" {
        return Some(&["image/webp"]);
    }
    if head.starts_with(b"%PDF-") {
        return Some(&["application/pdf"]);
    }
    if head.starts_with(&[0x1F, 0x8B]) {
        return Some(&["application/gzip"]);
    }
    if head.starts_with(&[b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C]) {
        return Some(&["application/x-7z-compressed"]);
    }
    if head.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some(EBML_FAMILY);
    }
    if head.len() >= 12 && &head[4..8] == b"ftyp" {
        return Some(BMFF_FAMILY);
    }
    if head.starts_with(b"fLaC") {
        return Some(&["audio/flac"]);
    }
    if head.starts_with(b"OggS") {
        return Some(&["audio/ogg"]);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::convert::Infallible;

    fn chunks(parts: Vec<&'static [u8]>) -> impl Stream<Item = Result<Bytes, Infallible>> + Unpin {
        stream::iter(
            parts
                .into_iter()
                .map(|p| Ok(Bytes::from_static(p)))
                .collect::<Vec<_>>(),
        )
    }

    async fn service(max_bytes: u64) -> (FileService, PathBuf) {
        let dir = std::env::temp_dir().join(format!("algoshelf-test-{}", uuid::Uuid::new_v4()));
        let svc = FileService::new(&dir, max_bytes).await.unwrap();
        (svc, dir)
    }

    #[tokio::test]
    async fn stored_bytes_are_published_intact() {
        let (svc, dir) = service(1024).await;

        let stored = svc
            .store("notes.txt", "text/plain", chunks(vec![b"hello ", b"world"]))
            .await
            .unwrap();

        assert_eq!(stored.size_bytes, 11);
        assert!(stored.storage_name.ends_with(".txt"));

        let published = fs::read(dir.join(&stored.storage_name)).await.unwrap();
        assert_eq!(published, b"hello world");

        // No temp residue.
        let mut tmp = fs::read_dir(dir.join(".tmp")).await.unwrap();
        assert!(tmp.next_entry().await.unwrap().is_none());

        fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn oversized_payload_rejected_and_cleaned_up() {
        let (svc, dir) = service(8).await;

        let err = svc
            .store("big.txt", "text/plain", chunks(vec![b"0123456789"]))
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::PayloadTooLarge { limit: 8 }));

        let mut tmp = fs::read_dir(dir.join(".tmp")).await.unwrap();
        assert!(tmp.next_entry().await.unwrap().is_none());

        fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn disallowed_type_rejected_before_writing() {
        let (svc, dir) = service(1024).await;

        let err = svc
            .store("evil.exe", "application/x-msdownload", chunks(vec![b"MZ"]))
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::UnsupportedMediaType { .. }));

        fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn magic_bytes_contradicting_declared_type_rejected() {
        let (svc, dir) = service(1024).await;

        // PNG magic declared as JPEG.
        let err = svc
            .store(
                "photo.jpg",
                "image/jpeg",
                chunks(vec![&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00]]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::UnsupportedMediaType { .. }));

        fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn container_signatures_accept_their_whole_family() {
        let (svc, dir) = service(1024).await;

        let heic: &[u8] = &[
            0, 0, 0, 24, b'f', b't', b'y', b'p', b'h', b'e', b'i', b'c', 0, 0, 0, 0,
        ];
        svc.store("photo.heic", "image/heic", chunks(vec![heic]))
            .await
            .unwrap();

        let mov: &[u8] = &[
            0, 0, 0, 20, b'f', b't', b'y', b'p', b'q', b't', b' ', b' ', 0, 0, 0, 0,
        ];
        svc.store("clip.mov", "video/quicktime", chunks(vec![mov]))
            .await
            .unwrap();

        let webm: &[u8] = &[0x1A, 0x45, 0xDF, 0xA3, 0x01, 0x00, 0x00, 0x00];
        svc.store("clip.webm", "video/webm", chunks(vec![webm]))
            .await
            .unwrap();

        fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn container_magic_outside_its_family_rejected() {
        let (svc, dir) = service(1024).await;

        // ftyp declared as a still PNG is still a contradiction.
        let mp4: &[u8] = &[
            0, 0, 0, 24, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm', 0, 0, 0, 0,
        ];
        let err = svc
            .store("frame.png", "image/png", chunks(vec![mp4]))
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::UnsupportedMediaType { .. }));

        fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn octet_stream_accepts_any_magic() {
        let (svc, dir) = service(1024).await;

        svc.store(
            "blob.bin",
            "application/octet-stream",
            chunks(vec![&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00]]),
        )
        .await
        .unwrap();

        fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn delete_is_not_found_the_second_time() {
        let (svc, dir) = service(1024).await;

        let stored = svc
            .store("a.txt", "text/plain", chunks(vec![b"x"]))
            .await
            .unwrap();

        svc.delete(&stored.storage_name).await.unwrap();
        assert!(matches!(
            svc.delete(&stored.storage_name).await,
            Err(FileError::NotFound)
        ));
        assert!(matches!(
            svc.path_for(&stored.storage_name).await,
            Err(FileError::NotFound)
        ));

        fs::remove_dir_all(dir).await.unwrap();
    }

    #[test]
    fn storage_names_never_carry_path_components() {
        let name = FileService::fresh_storage_name("../../etc/passwd");
        assert!(!name.contains('/'));
        assert!(!name.contains(".."));
    }

    #[test]
    fn sniffs_common_formats() {
        assert_eq!(
            sniff_compatible_types(b"%PDF-1.7"),
            Some(["application/pdf"].as_slice())
        );
        assert_eq!(
            sniff_compatible_types(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(["image/jpeg"].as_slice())
        );
        assert_eq!(sniff_compatible_types(b"plain old text"), None);

        let family =
            sniff_compatible_types(&[0, 0, 0, 24, b'f', b't', b'y', b'p', b'M', b'4', b'A', b' '])
                .unwrap();
        assert!(family.contains(&"video/mp4") && family.contains(&"image/heic"));
        let family = sniff_compatible_types(&[0x1A, 0x45, 0xDF, 0xA3]).unwrap();
        assert!(family.contains(&"video/webm") && family.contains(&"video/x-matroska"));
    }
}
