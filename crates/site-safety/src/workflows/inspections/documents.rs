use std::fmt::Debug;

use mime::Mime;

use crate::domain::{Finding, Inspection};

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// A rendered report ready to attach or upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub file_name: String,
    pub content_type: Mime,
    pub bytes: Vec<u8>,
}

/// Produces report artifacts for an inspection.
pub trait DocumentRenderer: Send + Sync + Debug {
    /// Editable draft sent back to the submitter.
    fn render_draft(
        &self,
        inspection: &Inspection,
        findings: &[Finding],
    ) -> Result<RenderedDocument, RenderError>;

    /// Final report distributed to client contacts and archived.
    fn render_final(
        &self,
        inspection: &Inspection,
        findings: &[Finding],
    ) -> Result<RenderedDocument, RenderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unsupported content type '{0}'")]
    ContentType(String),
    #[error("document rendering failed: {0}")]
    Failed(String),
}

/// Emits fixed placeholder payloads until real templates exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRenderer;

impl DocumentRenderer for PlaceholderRenderer {
    fn render_draft(
        &self,
        inspection: &Inspection,
        findings: &[Finding],
    ) -> Result<RenderedDocument, RenderError> {
        let content_type: Mime = DOCX_CONTENT_TYPE
            .parse()
            .map_err(|_| RenderError::ContentType(DOCX_CONTENT_TYPE.to_string()))?;
        tracing::debug!(
            inspection_id = %inspection.id,
            findings = findings.len(),
            "draft document rendered"
        );
        Ok(RenderedDocument {
            file_name: "draft-report.docx".to_string(),
            content_type,
            bytes: b"STUB WORD DOCUMENT".to_vec(),
        })
    }

    fn render_final(
        &self,
        inspection: &Inspection,
        findings: &[Finding],
    ) -> Result<RenderedDocument, RenderError> {
        tracing::debug!(
            inspection_id = %inspection.id,
            findings = findings.len(),
            "final document rendered"
        );
        Ok(RenderedDocument {
            file_name: "inspection-report.pdf".to_string(),
            content_type: mime::APPLICATION_PDF,
            bytes: b"STUB PDF DOCUMENT".to_vec(),
        })
    }
}
