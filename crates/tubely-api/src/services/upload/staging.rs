//! Scratch files owned by a single upload.
//!
//! Both types remove their file when dropped, so every early return, timeout
//! or cancelled request leaves nothing behind in the temp directory.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tubely_core::AppError;

const STAGING_PREFIX: &str = "tubely-upload-";

/// Raw upload bytes, fully written and rewound.
pub(crate) struct StagedUpload {
    file: NamedTempFile,
    size: u64,
}

impl StagedUpload {
    pub(crate) fn path(&self) -> &Path {
        self.file.path()
    }

    pub(crate) fn size(&self) -> u64 {
        self.size
    }

    /// Remove the file now instead of at end of scope.
    pub(crate) fn close(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove staged upload");
        }
    }
}

fn staging_error(context: &str, err: std::io::Error) -> AppError {
    AppError::Staging(format!("{}: {}", context, err))
}

/// Stream `body` into a fresh temp file under `temp_dir` (system temp dir if
/// unset). Fails with `PayloadTooLarge` once more than `max_bytes` arrive.
pub(crate) async fn stage_stream<S>(
    body: S,
    temp_dir: Option<&Path>,
    max_bytes: u64,
) -> Result<StagedUpload, AppError>
where
    S: Stream<Item = Result<Bytes, AppError>>,
{
    let mut builder = tempfile::Builder::new();
    builder.prefix(STAGING_PREFIX).suffix(".mp4");
    let named = match temp_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|e| staging_error("Failed to create temp file", e))?;

    let handle = named
        .as_file()
        .try_clone()
        .map_err(|e| staging_error("Failed to open temp file", e))?;
    let mut file = tokio::fs::File::from_std(handle);

    let mut body = std::pin::pin!(body);
    let mut size: u64 = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        size += chunk.len() as u64;
        if size > max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Upload exceeds {} bytes",
                max_bytes
            )));
        }
        file.write_all(&chunk)
            .await
            .map_err(|e| staging_error("Failed to write temp file", e))?;
    }

    file.flush()
        .await
        .map_err(|e| staging_error("Failed to flush temp file", e))?;
    file.seek(SeekFrom::Start(0))
        .await
        .map_err(|e| staging_error("Failed to rewind temp file", e))?;

    Ok(StagedUpload { file: named, size })
}

/// A tool-produced file that must not outlive the upload.
pub(crate) struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Track the path the tool actually reported, dropping the expected one.
    pub(crate) fn adopt(&mut self, path: PathBuf) {
        if path != self.path {
            remove_quietly(&self.path);
            self.path = path;
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        remove_quietly(&self.path);
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove scratch file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = Result<Bytes, AppError>> {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::from_static(p.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_stage_writes_all_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let staged = stage_stream(chunks(&["ftyp", "moov", "mdat"]), Some(dir.path()), 1024)
            .await
            .unwrap();

        assert_eq!(staged.size(), 12);
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"ftypmoovmdat");
        assert!(staged
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(STAGING_PREFIX));

        staged.close();
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let result = stage_stream(chunks(&["0123456789", "0123456789"]), Some(dir.path()), 15).await;

        assert!(matches!(result, Err(AppError::PayloadTooLarge(_))));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_stream_error_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(AppError::BadRequest("connection reset".into())),
        ]);
        let result = stage_stream(body, Some(dir.path()), 1024).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_scratch_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.mp4.processing");
        std::fs::write(&path, b"remuxed").unwrap();

        drop(ScratchFile::new(path.clone()));
        assert!(!path.exists());
    }

    #[test]
    fn test_scratch_file_adopt_removes_expected_path() {
        let dir = tempfile::tempdir().unwrap();
        let expected = dir.path().join("a.processing");
        let actual = dir.path().join("b.processing");
        std::fs::write(&expected, b"partial").unwrap();
        std::fs::write(&actual, b"remuxed").unwrap();

        let mut scratch = ScratchFile::new(expected.clone());
        scratch.adopt(actual.clone());
        assert!(!expected.exists());
        assert_eq!(scratch.path(), actual.as_path());

        drop(scratch);
        assert!(!actual.exists());
    }

    #[test]
    fn test_missing_scratch_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        drop(ScratchFile::new(dir.path().join("never-created")));
    }
}
