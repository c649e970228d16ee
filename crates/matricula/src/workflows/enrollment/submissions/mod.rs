//! The shared review workflow for documents, installment supports, and
//! administrative requests. All three kinds move through one status
//! lifecycle; only the payload differs.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    DocumentKind, RequestState, ReviewStatus, SubmissionId, SubmissionKind, SubmissionPayload,
    SubmissionRecord,
};
pub use repository::{SubmissionRepository, SubmissionStatusView};
pub use router::enrollment_router;
pub use service::{
    NewSubmission, ReviewDecision, ReviewError, ReviewService, StudentStatusView,
};
