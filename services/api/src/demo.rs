use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::Args;

use crate::infra::{build_portal, PortalStores};
use matricula::config::PortalConfig;
use matricula::error::AppError;
use matricula::workflows::enrollment::memory::{MemoryFileStore, MemoryInstallmentRepository};
use matricula::workflows::enrollment::submissions::{
    DocumentKind, NewSubmission, ReviewDecision, SubmissionPayload, SubmissionRecord,
};
use matricula::workflows::enrollment::{
    import_students, parse_roster, Actor, ActorRole, EnrollmentStage, FileReference, FileStore,
    FileUpload, Installment, InstallmentId, InstallmentRepository, NotificationStore, Student,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print every notification row at the end of the walkthrough
    #[arg(long)]
    pub(crate) list_notifications: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RosterValidateArgs {
    /// Path to the roster CSV export (columns: Nombre, Correo)
    #[arg(long)]
    pub(crate) file: PathBuf,
}

pub(crate) fn run_roster_validate(args: RosterValidateArgs) -> Result<(), AppError> {
    let file = std::fs::File::open(&args.file)?;
    let drafts = parse_roster(file)?;

    println!("Roster {} is importable", args.file.display());
    for draft in &drafts {
        let email = if draft.email.is_empty() {
            "(sin correo)"
        } else {
            &draft.email
        };
        println!("  {} <{}>", draft.full_name, email);
    }
    println!("{} students would start at 'Suscrito'", drafts.len());
    Ok(())
}

const DEMO_ROSTER: &str = "\
Nombre,Correo
Ana María Pérez,ana@ejemplo.edu
Luis Cabrera,luis@ejemplo.edu
";

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    println!("Enrollment portal demo");

    let stores = build_portal(PortalConfig::default());
    let files = MemoryFileStore::default();
    let installments = MemoryInstallmentRepository::default();

    let students = import_students(
        stores.students.as_ref(),
        parse_roster(DEMO_ROSTER.as_bytes())?,
    )?;
    let ana = &students[0];
    let luis = &students[1];
    println!("Imported {} students at 'Suscrito'", students.len());

    seed_installments(&installments, ana)?;

    let admin = Actor::new("admin-1", ActorRole::Admin);
    let root = Actor::new("root-1", ActorRole::Superuser);

    // Ana clears the whole document checklist.
    for kind in DocumentKind::required() {
        let record = submit_document(&stores, &files, ana, kind)?;
        stores
            .portal
            .review()
            .review(&admin, &record.id, ReviewDecision::Approve { note: None })?;
    }
    println!(
        "Ana's checklist approved; stage is now '{}'",
        stores.portal.stages().current_stage(&ana.id)?.label()
    );

    // Luis gets his photo rejected and resubmits.
    let foto = submit_document(&stores, &files, luis, DocumentKind::Foto)?;
    stores.portal.review().review(
        &admin,
        &foto.id,
        ReviewDecision::Reject {
            reason: "Foto borrosa".to_string(),
        },
    )?;
    let replacement = stores.portal.review().resubmit(
        &Actor::new(luis.id.0.clone(), ActorRole::Estudiante),
        &foto.id,
        SubmissionPayload::Document {
            kind: DocumentKind::Foto,
            file: upload(&files, "foto-v2.jpg")?,
        },
    )?;
    println!(
        "Luis resubmitted {} replacing {} (reason on file: Foto borrosa)",
        replacement.id.0, foto.id.0
    );

    // Ana pays her first installment and files the receipt.
    let cuota = installments.for_student(&ana.id)?.remove(0);
    let support = stores.portal.review().submit(
        &Actor::new(ana.id.0.clone(), ActorRole::Estudiante),
        NewSubmission {
            student_id: ana.id.clone(),
            payload: SubmissionPayload::InstallmentSupport {
                installment_id: cuota.id.clone(),
                amount_cents: cuota.amount_cents,
                due_date: cuota.due_date,
                receipt: upload(&files, "recibo-cuota-1.pdf")?,
            },
        },
    )?;
    stores
        .portal
        .review()
        .review(&admin, &support.id, ReviewDecision::Approve { note: None })?;
    println!("Payment support for {} approved", cuota.id.0);

    // Staff answer an administrative request.
    let request = stores.portal.review().submit(
        &Actor::new(ana.id.0.clone(), ActorRole::Estudiante),
        NewSubmission {
            student_id: ana.id.clone(),
            payload: SubmissionPayload::Request {
                subject: "Cambio de jornada".to_string(),
                message: "Solicito cambio a la jornada nocturna.".to_string(),
            },
        },
    )?;
    let resolved = stores.portal.review().review(
        &admin,
        &request.id,
        ReviewDecision::Approve {
            note: Some("Aprobado a partir del próximo periodo.".to_string()),
        },
    )?;
    println!(
        "Request {} resolved as '{}'",
        resolved.id.0,
        resolved
            .request_state()
            .map(|state| state.label())
            .unwrap_or("?")
    );

    // A superuser fixes an administrative mistake with an audited revert.
    stores.portal.stages().advance(
        &ana.id,
        EnrollmentStage::RegistroValidado,
        &admin,
        Some("Registro verificado".to_string()),
    )?;
    stores.portal.stages().advance(
        &ana.id,
        EnrollmentStage::DocumentosCompletos,
        &root,
        Some("Error administrativo".to_string()),
    )?;

    println!("\nAna's stage history (newest first):");
    for entry in stores.portal.stages().history_for(&ana.id)? {
        let view = entry.to_view();
        println!(
            "  {} -> {} [{}{}] por {}",
            view.previous_stage,
            view.new_stage,
            view.validation_status,
            if view.reverted { ", reverted" } else { "" },
            view.changed_by
        );
    }

    let status = stores.portal.review().student_status(&ana.id)?;
    println!(
        "\nAna: stage '{}', {} pending, {} rejected, {} unread notifications",
        status.current_stage,
        status.pending_count,
        status.rejected_count,
        stores.portal.notifications().unread_count(&ana.id.0)?
    );

    if args.list_notifications {
        for student in [ana, luis] {
            println!("\nInbox for {}:", student.full_name);
            for row in stores.notifications.for_user(&student.id.0)? {
                println!("  [{}] {}: {}", row.kind.label(), row.title, row.body);
            }
        }
    }

    Ok(())
}

fn seed_installments(
    installments: &MemoryInstallmentRepository,
    student: &Student,
) -> Result<(), AppError> {
    for (number, due) in [(1, (2026, 2, 15)), (2, (2026, 3, 15))] {
        installments.insert(Installment {
            id: InstallmentId(format!("cuota-{}-{number}", student.id.0)),
            student_id: student.id.clone(),
            number,
            amount_cents: 185_000,
            due_date: NaiveDate::from_ymd_opt(due.0, due.1, due.2).expect("demo dates are valid"),
        })?;
    }
    Ok(())
}

fn submit_document(
    stores: &PortalStores,
    files: &MemoryFileStore,
    student: &Student,
    kind: DocumentKind,
) -> Result<SubmissionRecord, AppError> {
    let file = upload(files, &format!("{}.pdf", kind.label()))?;
    let record = stores.portal.review().submit(
        &Actor::new(student.id.0.clone(), ActorRole::Estudiante),
        NewSubmission {
            student_id: student.id.clone(),
            payload: SubmissionPayload::Document { kind, file },
        },
    )?;
    Ok(record)
}

fn upload(files: &MemoryFileStore, name: &str) -> Result<FileReference, AppError> {
    let content_type = mime_guess::from_path(name).first_or_octet_stream();
    let reference = files.save(FileUpload {
        name: name.to_string(),
        content_type,
        bytes: demo_bytes(name),
    })?;
    Ok(reference)
}

// Placeholder bytes; real uploads arrive through the blob boundary.
fn demo_bytes(name: &str) -> Vec<u8> {
    format!("contenido de prueba para {name}").into_bytes()
}
