use super::domain::{EnrollmentStage, Installment, Student, StudentId};

/// Error enumeration for persistence failures. `Unavailable` is the only
/// non-recoverable member; callers propagate it verbatim.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction for the student anchor row.
pub trait StudentRepository: Send + Sync {
    fn insert(&self, student: Student) -> Result<Student, RepositoryError>;

    fn fetch(&self, id: &StudentId) -> Result<Option<Student>, RepositoryError>;

    /// Conditional stage update keyed on the previous stage. Implementations
    /// must reject the write with `Conflict` when the stored stage no longer
    /// matches `from`, so racing advancement requests cannot lose updates.
    fn transition_stage(
        &self,
        id: &StudentId,
        from: EnrollmentStage,
        to: EnrollmentStage,
    ) -> Result<(), RepositoryError>;
}

/// Storage abstraction for the payment schedule installments.
pub trait InstallmentRepository: Send + Sync {
    fn insert(&self, installment: Installment) -> Result<Installment, RepositoryError>;

    fn for_student(&self, id: &StudentId) -> Result<Vec<Installment>, RepositoryError>;
}
