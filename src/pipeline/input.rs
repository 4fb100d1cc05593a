//! Upload intake: accept a file only if it is typed or named as a PDF.
//!
//! The check is deliberately shallow. Whether the bytes really are a PDF is
//! decided by the extractor, which reports [`StudyError::ExtractionFailed`]
//! for anything it cannot parse.

use crate::error::StudyError;
use std::path::Path;
use tracing::debug;

/// MIME type accepted for uploads.
pub const PDF_MIME: &str = "application/pdf";

/// A file as handed over by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    /// Declared content type, if the front-end supplied one.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

impl Upload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: Option<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes: bytes.into(),
        }
    }

    /// Read a local file as an upload.
    ///
    /// The content type is inferred from a `.pdf` extension and left unset
    /// otherwise, so [`validate_upload`] still rejects non-PDF names.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, StudyError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => StudyError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => StudyError::FileNotFound {
                path: path.to_path_buf(),
            },
        })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let content_type = has_pdf_extension(&file_name).then(|| PDF_MIME.to_string());

        debug!("Read upload '{}' ({} bytes)", file_name, bytes.len());
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }
}

/// Accept `application/pdf` (parameters ignored) or a `.pdf` file name.
pub fn validate_upload(upload: &Upload) -> Result<(), StudyError> {
    let typed_pdf = upload
        .content_type
        .as_deref()
        .map(is_pdf_mime)
        .unwrap_or(false);

    if typed_pdf || has_pdf_extension(&upload.file_name) {
        return Ok(());
    }

    Err(StudyError::UnsupportedUpload {
        file_name: upload.file_name.clone(),
        content_type: upload
            .content_type
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
    })
}

fn is_pdf_mime(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case(PDF_MIME))
        .unwrap_or(false)
}

fn has_pdf_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
