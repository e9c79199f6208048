//! PDF evidence parser — extracts text with `pdftotext` (poppler-utils).

use std::io::Write;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::warn;

use chagok_core::{Error, MediaType, Result};

use super::{EvidenceParser, ParsedEvidence};

/// Per-invocation timeout for the extraction command.
const PDF_CMD_TIMEOUT_SECS: u64 = 60;

/// Parser for PDF documents (court filings, certificates, scanned letters).
///
/// Shells out to `pdftotext -layout`; scanned PDFs with no text layer yield
/// an empty extraction, which is committed as-is rather than failed — the
/// record still carries its summary-less content for operator review.
pub struct PdfParser;

impl PdfParser {
    pub fn new() -> Self {
        Self
    }

    async fn run_pdftotext(path: &std::path::Path) -> Result<String> {
        let mut cmd = Command::new("pdftotext");
        cmd.arg("-layout").arg(path).arg("-");

        let output = tokio::time::timeout(
            std::time::Duration::from_secs(PDF_CMD_TIMEOUT_SECS),
            cmd.output(),
        )
        .await
        .map_err(|_| Error::Internal("pdftotext timed out".to_string()))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Internal(format!("pdftotext failed: {}", stderr.trim())));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EvidenceParser for PdfParser {
    fn media_type(&self) -> MediaType {
        MediaType::Pdf
    }

    async fn parse(&self, data: &[u8], filename: &str) -> Result<ParsedEvidence> {
        let mut file = NamedTempFile::new()?;
        file.write_all(data)?;

        let text = Self::run_pdftotext(file.path()).await?;
        if text.trim().is_empty() {
            warn!(
                subsystem = "worker",
                component = "pdf_parser",
                filename = %filename,
                "PDF has no extractable text layer"
            );
        }

        Ok(ParsedEvidence {
            text: text.trim().to_string(),
            speaker: None,
            labels: Vec::new(),
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match Command::new("pdftotext").arg("-v").output().await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "pdf"
    }
}
