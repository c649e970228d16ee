//! In-memory store adapters backing the default server wiring, the CLI demo,
//! and the test suites. Mutex-per-store is enough for the single-process,
//! request-per-operation model; the conditional stage update provides the
//! same lost-update protection a relational backend would.

use std::collections::HashMap;
use std::sync::Mutex;

use super::domain::{EnrollmentStage, Installment, StageHistoryEntry, Student, StudentId};
use super::history::HistoryLedger;
use super::notifications::{Notification, NotificationId, NotificationStore};
use super::repository::{InstallmentRepository, RepositoryError, StudentRepository};
use super::storage::{validate_upload, FileReference, FileStore, FileUpload, StorageError};
use super::submissions::domain::{
    DocumentKind, ReviewStatus, SubmissionId, SubmissionPayload, SubmissionRecord,
};
use super::submissions::repository::SubmissionRepository;

#[derive(Default)]
pub struct MemoryStudentRepository {
    students: Mutex<HashMap<String, Student>>,
}

impl StudentRepository for MemoryStudentRepository {
    fn insert(&self, student: Student) -> Result<Student, RepositoryError> {
        let mut guard = self.students.lock().expect("student mutex poisoned");
        if guard.contains_key(&student.id.0) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(student.id.0.clone(), student.clone());
        Ok(student)
    }

    fn fetch(&self, id: &StudentId) -> Result<Option<Student>, RepositoryError> {
        let guard = self.students.lock().expect("student mutex poisoned");
        Ok(guard.get(&id.0).cloned())
    }

    fn transition_stage(
        &self,
        id: &StudentId,
        from: EnrollmentStage,
        to: EnrollmentStage,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.students.lock().expect("student mutex poisoned");
        let student = guard.get_mut(&id.0).ok_or(RepositoryError::NotFound)?;
        if student.stage != from {
            return Err(RepositoryError::Conflict);
        }
        student.stage = to;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryInstallmentRepository {
    installments: Mutex<Vec<Installment>>,
}

impl InstallmentRepository for MemoryInstallmentRepository {
    fn insert(&self, installment: Installment) -> Result<Installment, RepositoryError> {
        let mut guard = self.installments.lock().expect("installment mutex poisoned");
        if guard.iter().any(|row| row.id == installment.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(installment.clone());
        Ok(installment)
    }

    fn for_student(&self, id: &StudentId) -> Result<Vec<Installment>, RepositoryError> {
        let guard = self.installments.lock().expect("installment mutex poisoned");
        Ok(guard
            .iter()
            .filter(|row| &row.student_id == id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemorySubmissionRepository {
    records: Mutex<Vec<SubmissionRecord>>,
}

impl SubmissionRepository for MemorySubmissionRepository {
    fn insert(&self, record: SubmissionRecord) -> Result<SubmissionRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("submission mutex poisoned");
        if guard.iter().any(|row| row.id == record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn update(&self, record: SubmissionRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("submission mutex poisoned");
        match guard.iter_mut().find(|row| row.id == record.id) {
            Some(row) => {
                *row = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<SubmissionRecord>, RepositoryError> {
        let guard = self.records.lock().expect("submission mutex poisoned");
        Ok(guard.iter().find(|row| &row.id == id).cloned())
    }

    fn for_student(&self, id: &StudentId) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        let guard = self.records.lock().expect("submission mutex poisoned");
        Ok(guard
            .iter()
            .filter(|row| &row.student_id == id)
            .cloned()
            .collect())
    }

    fn approved_document_kinds(
        &self,
        id: &StudentId,
    ) -> Result<Vec<DocumentKind>, RepositoryError> {
        let guard = self.records.lock().expect("submission mutex poisoned");
        let mut kinds: Vec<DocumentKind> = Vec::new();
        for row in guard.iter() {
            if &row.student_id != id || row.status != ReviewStatus::Approved {
                continue;
            }
            if let SubmissionPayload::Document { kind, .. } = &row.payload {
                if !kinds.contains(kind) {
                    kinds.push(*kind);
                }
            }
        }
        Ok(kinds)
    }
}

#[derive(Default)]
pub struct MemoryHistoryLedger {
    entries: Mutex<Vec<StageHistoryEntry>>,
}

impl HistoryLedger for MemoryHistoryLedger {
    fn append(&self, entry: StageHistoryEntry) -> Result<(), RepositoryError> {
        let mut guard = self.entries.lock().expect("history mutex poisoned");
        guard.push(entry);
        Ok(())
    }

    fn for_student(&self, id: &StudentId) -> Result<Vec<StageHistoryEntry>, RepositoryError> {
        let guard = self.entries.lock().expect("history mutex poisoned");
        Ok(guard
            .iter()
            .filter(|entry| &entry.student_id == id)
            .rev()
            .cloned()
            .collect())
    }
}

/// Keeps a per-user unread counter next to the rows so `unread_count` is a
/// map lookup, the in-memory analog of an indexed boolean column.
#[derive(Default)]
pub struct MemoryNotificationStore {
    rows: Mutex<Vec<Notification>>,
    unread: Mutex<HashMap<String, usize>>,
}

impl NotificationStore for MemoryNotificationStore {
    fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError> {
        let mut rows = self.rows.lock().expect("notification mutex poisoned");
        if rows.iter().any(|row| row.id == notification.id) {
            return Err(RepositoryError::Conflict);
        }
        if !notification.is_read {
            let mut unread = self.unread.lock().expect("unread mutex poisoned");
            *unread.entry(notification.user_id.clone()).or_default() += 1;
        }
        rows.push(notification.clone());
        Ok(notification)
    }

    fn fetch(&self, id: &NotificationId) -> Result<Option<Notification>, RepositoryError> {
        let rows = self.rows.lock().expect("notification mutex poisoned");
        Ok(rows.iter().find(|row| &row.id == id).cloned())
    }

    fn mark_read(&self, id: &NotificationId) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().expect("notification mutex poisoned");
        let row = rows
            .iter_mut()
            .find(|row| &row.id == id)
            .ok_or(RepositoryError::NotFound)?;
        if !row.is_read {
            row.is_read = true;
            let mut unread = self.unread.lock().expect("unread mutex poisoned");
            if let Some(count) = unread.get_mut(&row.user_id) {
                *count = count.saturating_sub(1);
            }
        }
        Ok(())
    }

    fn mark_all_read(&self, user_id: &str) -> Result<usize, RepositoryError> {
        let mut rows = self.rows.lock().expect("notification mutex poisoned");
        let mut flipped = 0;
        for row in rows.iter_mut().filter(|row| row.user_id == user_id) {
            if !row.is_read {
                row.is_read = true;
                flipped += 1;
            }
        }
        let mut unread = self.unread.lock().expect("unread mutex poisoned");
        unread.insert(user_id.to_string(), 0);
        Ok(flipped)
    }

    fn for_user(&self, user_id: &str) -> Result<Vec<Notification>, RepositoryError> {
        let rows = self.rows.lock().expect("notification mutex poisoned");
        Ok(rows
            .iter()
            .filter(|row| row.user_id == user_id)
            .rev()
            .cloned()
            .collect())
    }

    fn unread_count(&self, user_id: &str) -> Result<usize, RepositoryError> {
        let unread = self.unread.lock().expect("unread mutex poisoned");
        Ok(unread.get(user_id).copied().unwrap_or(0))
    }
}

/// Blob store keeping bytes in a map; references are sequential keys.
#[derive(Default)]
pub struct MemoryFileStore {
    files: Mutex<HashMap<String, FileUpload>>,
    sequence: Mutex<u64>,
}

impl FileStore for MemoryFileStore {
    fn save(&self, upload: FileUpload) -> Result<FileReference, StorageError> {
        validate_upload(&upload)?;
        let mut sequence = self.sequence.lock().expect("sequence mutex poisoned");
        *sequence += 1;
        let reference = format!("blob-{:06}", *sequence);
        let mut files = self.files.lock().expect("file mutex poisoned");
        files.insert(reference.clone(), upload);
        Ok(FileReference(reference))
    }

    fn resolve_url(&self, reference: &FileReference) -> Result<String, StorageError> {
        let files = self.files.lock().expect("file mutex poisoned");
        if files.contains_key(&reference.0) {
            Ok(format!("memory://{}", reference.0))
        } else {
            Err(StorageError::NotFound(reference.0.clone()))
        }
    }

    fn delete(&self, reference: &FileReference) -> Result<bool, StorageError> {
        let mut files = self.files.lock().expect("file mutex poisoned");
        Ok(files.remove(&reference.0).is_some())
    }
}
