//! Upload-event handler: the worker's per-invocation entry point.
//!
//! Receives a raw event document, resolves each object-created record to an
//! evidence record, runs the parse/analyze pipeline, and commits through
//! the result writer. The handler itself never fails the invocation; every
//! record lands in the summary as processed, skipped, or errored, so the
//! delivering platform never retries a batch on our behalf.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{error, info, warn};

use chagok_core::{
    parse_object_key, AnalysisOutcome, Error, EvidenceRepository, EvidenceStatus, MediaType,
    ParsedObjectKey, Result,
};
use chagok_storage::{parse_upload_event, BlobStore, ObjectCreated, UploadEvent};

use crate::adapters::ParserRegistry;
use crate::analyzer::EvidenceAnalyzer;
use crate::result_writer::ResultWriter;
use crate::router::route_extension;

/// Per-invocation outcome counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HandlerSummary {
    /// Records fully analyzed and committed (success or recorded failure).
    pub processed: usize,
    /// Records outside this worker's remit (bad keys, malformed records,
    /// non-storage events).
    pub skipped: usize,
    /// Records that hit an infrastructure error and could not be committed.
    pub errors: usize,
}

pub struct UploadHandler {
    blobs: Arc<dyn BlobStore>,
    evidence: Arc<dyn EvidenceRepository>,
    registry: ParserRegistry,
    analyzer: EvidenceAnalyzer,
    writer: ResultWriter,
}

impl UploadHandler {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        evidence: Arc<dyn EvidenceRepository>,
        registry: ParserRegistry,
        analyzer: EvidenceAnalyzer,
        writer: ResultWriter,
    ) -> Self {
        Self {
            blobs,
            evidence,
            registry,
            analyzer,
            writer,
        }
    }

    /// Process one event document. Infallible by design: per-record failures
    /// are counted, logged, and where possible written to the record's
    /// status, but the invocation always completes.
    pub async fn handle_event(&self, event: &JsonValue) -> HandlerSummary {
        let mut summary = HandlerSummary::default();

        let records = match parse_upload_event(event) {
            UploadEvent::Records { records, malformed } => {
                summary.skipped += malformed;
                records
            }
            UploadEvent::Ignored { reason } => {
                info!(
                    subsystem = "worker",
                    component = "handler",
                    error_msg = %reason,
                    "Event ignored"
                );
                return summary;
            }
        };

        for record in records {
            match self.handle_record(&record).await {
                Ok(()) => summary.processed += 1,
                Err(Error::InvalidObjectKey(key)) => {
                    warn!(
                        subsystem = "worker",
                        component = "handler",
                        object_key = %key,
                        "Key outside evidence grammar; skipped"
                    );
                    summary.skipped += 1;
                }
                Err(e) => {
                    error!(
                        subsystem = "worker",
                        component = "handler",
                        object_key = %record.key,
                        error_msg = %e,
                        "Record processing errored"
                    );
                    summary.errors += 1;
                }
            }
        }

        info!(
            subsystem = "worker",
            component = "handler",
            processed = summary.processed,
            skipped = summary.skipped,
            errors = summary.errors,
            "Invocation complete"
        );
        summary
    }

    async fn handle_record(&self, record: &ObjectCreated) -> Result<()> {
        let parsed_key = parse_object_key(&record.key)?;
        let case_id = parsed_key.case_id().to_string();
        let filename = parsed_key.filename().to_string();
        let evidence_id = match &parsed_key {
            ParsedObjectKey::Canonical { evidence_id, .. } => Some(evidence_id.clone()),
            ParsedObjectKey::Legacy { .. } => None,
        };

        let media_type = match route_extension(&filename) {
            Ok(mt) => mt,
            Err(Error::UnsupportedMediaType(detail)) => {
                return self
                    .reject_unsupported(&case_id, evidence_id.as_deref(), &detail)
                    .await;
            }
            Err(e) => return Err(e),
        };

        self.mark_processing(&case_id, evidence_id.as_deref()).await?;

        let data = self.blobs.get(&record.key).await?;

        let outcome = self.analyze(media_type, &data, &filename).await;
        self.writer
            .commit(&case_id, evidence_id.as_deref(), &record.key, media_type, outcome)
            .await?;
        Ok(())
    }

    /// Run the parse + analysis steps, folding failures into a committable
    /// outcome. Failures here are analysis failures, not infrastructure
    /// ones; they mark the record `failed` with a reason and are never
    /// retried automatically.
    async fn analyze(&self, media_type: MediaType, data: &[u8], filename: &str) -> AnalysisOutcome {
        let Some(parser) = self.registry.get(media_type) else {
            return AnalysisOutcome::Failure {
                reason: format!("no parser registered for {}", media_type),
            };
        };

        let parsed = match parser.parse(data, filename).await {
            Ok(parsed) => parsed,
            Err(e) => {
                return AnalysisOutcome::Failure {
                    reason: format!("{} parser: {}", parser.name(), e),
                }
            }
        };

        match self.analyzer.analyze(&parsed).await {
            Ok(success) => AnalysisOutcome::Success(success),
            Err(e) => AnalysisOutcome::Failure {
                reason: format!("analysis: {}", e),
            },
        }
    }

    /// Unsupported extension: fail the placeholder when one exists; a
    /// legacy key has no record to fail, so the record is skipped.
    async fn reject_unsupported(
        &self,
        case_id: &str,
        evidence_id: Option<&str>,
        detail: &str,
    ) -> Result<()> {
        let reason = format!("unsupported media type: {}", detail);
        match evidence_id {
            Some(id) => {
                self.evidence
                    .set_status(case_id, id, EvidenceStatus::Failed, Some(&reason))
                    .await?;
                warn!(
                    subsystem = "worker",
                    component = "handler",
                    case_id = %case_id,
                    evidence_id = %id,
                    error_msg = %reason,
                    "Evidence failed"
                );
                Ok(())
            }
            None => Err(Error::InvalidObjectKey(format!(
                "legacy key with {}",
                reason
            ))),
        }
    }

    /// Flip an existing placeholder to `processing`. Legacy keys have no
    /// record yet; terminal records (redelivery) keep their status and the
    /// commit's hash check handles deduplication.
    async fn mark_processing(&self, case_id: &str, evidence_id: Option<&str>) -> Result<()> {
        let Some(id) = evidence_id else {
            return Ok(());
        };
        let Some(record) = self.evidence.get(case_id, id).await? else {
            return Ok(());
        };
        if record.status.can_transition_to(EvidenceStatus::Processing) {
            self.evidence
                .set_status(case_id, id, EvidenceStatus::Processing, None)
                .await?;
        }
        Ok(())
    }
}
