//! Bulk onboarding of students from an admissions roster CSV. Each valid row
//! becomes a student at the start of the pipeline.

use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Deserializer};

use super::domain::{EnrollmentStage, Student, StudentId};
use super::repository::{RepositoryError, StudentRepository};

#[derive(Debug, thiserror::Error)]
pub enum RosterImportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("fila {row}: el nombre es obligatorio")]
    MissingName { row: usize },
    #[error("fila {row}: correo '{value}' no es válido")]
    InvalidEmail { row: usize, value: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Parsed roster row before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDraft {
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "Nombre")]
    name: String,
    #[serde(rename = "Correo", default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
}

static STUDENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_student_id() -> StudentId {
    let id = STUDENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    StudentId(format!("est-{id:06}"))
}

/// Parse a roster export into drafts, validating names and emails row by row.
pub fn parse_roster<R: Read>(reader: R) -> Result<Vec<StudentDraft>, RosterImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut drafts = Vec::new();

    for (index, record) in csv_reader.deserialize::<RosterRow>().enumerate() {
        // Header is line 1; data starts at line 2.
        let row = index + 2;
        let parsed = record?;

        let full_name = normalize_name(&parsed.name);
        if full_name.is_empty() {
            return Err(RosterImportError::MissingName { row });
        }

        let email = match parsed.email {
            Some(raw) => {
                let email = normalize_email(&raw);
                if !email.contains('@') {
                    return Err(RosterImportError::InvalidEmail { row, value: raw });
                }
                email
            }
            None => String::new(),
        };

        drafts.push(StudentDraft { full_name, email });
    }

    Ok(drafts)
}

/// Persist drafts as students at `suscrito`. Returns the stored rows.
pub fn import_students<S: StudentRepository>(
    repository: &S,
    drafts: Vec<StudentDraft>,
) -> Result<Vec<Student>, RosterImportError> {
    let mut stored = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let student = Student {
            id: next_student_id(),
            full_name: draft.full_name,
            email: draft.email,
            stage: EnrollmentStage::first(),
            created_at: Utc::now(),
        };
        stored.push(repository.insert(student)?);
    }
    Ok(stored)
}

fn normalize_name(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_email(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
