use serde::Serialize;

use super::domain::{StageHistoryEntry, StudentId};
use super::repository::RepositoryError;

/// Append-only audit ledger for stage transitions. Entries are never updated
/// or deleted once written.
pub trait HistoryLedger: Send + Sync {
    fn append(&self, entry: StageHistoryEntry) -> Result<(), RepositoryError>;

    /// Entries in reverse-chronological order, most recent first. The
    /// presentation layer depends on this ordering.
    fn for_student(&self, id: &StudentId) -> Result<Vec<StageHistoryEntry>, RepositoryError>;
}

/// Flattened ledger entry for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct StageHistoryView {
    pub student_id: String,
    pub previous_stage: &'static str,
    pub new_stage: &'static str,
    pub changed_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    pub validation_status: &'static str,
    pub reverted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl StageHistoryEntry {
    pub fn to_view(&self) -> StageHistoryView {
        StageHistoryView {
            student_id: self.student_id.0.clone(),
            previous_stage: self.previous_stage.label(),
            new_stage: self.new_stage.label(),
            changed_by: self.changed_by.clone(),
            comments: self.comments.clone(),
            validation_status: self.validation_status.label(),
            reverted: self.reverted,
            created_at: self.created_at,
        }
    }
}
