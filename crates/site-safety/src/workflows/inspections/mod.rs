//! Inspection records and the Draft/Final submission workflow.
//!
//! A Final submission is best-effort for every external side effect (time log, report email,
//! document upload, action creation) and unconditional for the `Draft -> Final` transition.
//! Each optional step is reported back in [`SubmissionOutcome::steps`].

pub mod documents;
mod guard;
pub mod outcome;
pub mod records;
pub mod router;
pub mod submission;

#[cfg(test)]
mod tests;

pub use documents::{DocumentRenderer, PlaceholderRenderer, RenderError, RenderedDocument};
pub use guard::{SubmissionClaim, SubmissionGuard};
pub use outcome::{StepError, StepReport, StepStatus, SubmissionOutcome, SubmissionStep};
pub use records::{
    InspectionChanges, InspectionDetail, InspectionRecordService, NewFinding, NewInspection,
    RecordServiceError,
};
pub use router::inspection_router;
pub use submission::{
    InspectionSubmitService, SubmissionError, SubmitInspectionRequest, SubmitType,
    ValidationError,
};
