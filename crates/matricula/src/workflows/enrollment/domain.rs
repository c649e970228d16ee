use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for enrolled students.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudentId(pub String);

/// Identifier wrapper for payment installments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstallmentId(pub String);

/// The fixed enrollment pipeline. Ordering is array position, so "next
/// stage" and "is forward" are index arithmetic, never string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStage {
    Suscrito,
    DocumentosCompletos,
    RegistroValidado,
    ProcesoUniversitario,
    Matriculado,
    InicioClases,
    EstudianteActivo,
    PagosAlDia,
    ProcesoFinalizado,
}

impl EnrollmentStage {
    pub const fn ordered() -> [Self; 9] {
        [
            Self::Suscrito,
            Self::DocumentosCompletos,
            Self::RegistroValidado,
            Self::ProcesoUniversitario,
            Self::Matriculado,
            Self::InicioClases,
            Self::EstudianteActivo,
            Self::PagosAlDia,
            Self::ProcesoFinalizado,
        ]
    }

    pub const fn first() -> Self {
        Self::Suscrito
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Self> {
        Self::ordered().get(self.index() + 1).copied()
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Suscrito => "Suscrito",
            Self::DocumentosCompletos => "Documentos Completos",
            Self::RegistroValidado => "Registro Validado",
            Self::ProcesoUniversitario => "Proceso Universitario",
            Self::Matriculado => "Matriculado",
            Self::InicioClases => "Inicio de Clases",
            Self::EstudianteActivo => "Estudiante Activo",
            Self::PagosAlDia => "Pagos al Día",
            Self::ProcesoFinalizado => "Proceso Finalizado",
        }
    }
}

/// Roles handed to the core by the identity boundary. The core trusts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Estudiante,
    Admin,
    Superuser,
}

impl ActorRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Estudiante => "estudiante",
            Self::Admin => "admin",
            Self::Superuser => "superuser",
        }
    }

    /// Staff may open, approve, and reject submissions and advance stages.
    pub const fn can_review(self) -> bool {
        matches!(self, Self::Admin | Self::Superuser)
    }

    /// Out-of-order jumps and reverts require the superuser override.
    pub const fn can_override(self) -> bool {
        matches!(self, Self::Superuser)
    }
}

/// The authenticated caller of every mutating operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: ActorRole) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    pub fn owns(&self, student_id: &StudentId) -> bool {
        self.id == student_id.0
    }
}

/// One row per identity; the owning anchor for every submission record.
/// `stage` is mutated only by the stage machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub full_name: String,
    pub email: String,
    pub stage: EnrollmentStage,
    pub created_at: DateTime<Utc>,
}

/// Payment installment a support receipt can be attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub student_id: StudentId,
    pub number: u8,
    pub amount_cents: u64,
    pub due_date: NaiveDate,
}

/// Outcome recorded on every stage transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Approved,
    Overridden,
    Rejected,
}

impl ValidationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Overridden => "overridden",
            Self::Rejected => "rejected",
        }
    }
}

/// Immutable audit record of one enrollment-stage transition. Reverts are
/// stored as forward-style entries with `reverted` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageHistoryEntry {
    pub student_id: StudentId,
    pub previous_stage: EnrollmentStage,
    pub new_stage: EnrollmentStage,
    pub changed_by: String,
    pub comments: Option<String>,
    pub validation_status: ValidationStatus,
    pub reverted: bool,
    pub created_at: DateTime<Utc>,
}
