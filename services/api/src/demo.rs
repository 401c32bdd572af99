use crate::infra::InMemoryApprovalsGateway;
use clap::Args;
use nodues::error::AppError;
use nodues::session::{ActorIdentity, SessionContext};
use nodues::workflows::clearance::{
    export_csv, ClearanceService, DecisionAction, StageStatus, StatusFilter,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Role the demo session acts as
    #[arg(long, default_value = "library")]
    pub(crate) role: String,
    /// Free-text query applied to the listing
    #[arg(long, default_value = "")]
    pub(crate) query: String,
    /// Status filter applied to the listing (defaults to all)
    #[arg(long)]
    pub(crate) status: Option<String>,
    /// Skip the decision portion of the demo
    #[arg(long)]
    pub(crate) skip_decision: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct HistoryArgs {
    /// Role used to read the audit trail
    #[arg(long, default_value = "admin")]
    pub(crate) role: String,
    /// Emit CSV instead of a line listing
    #[arg(long)]
    pub(crate) csv: bool,
}

fn build_service(role: &str) -> Arc<ClearanceService<InMemoryApprovalsGateway>> {
    let session = Arc::new(SessionContext::new(ActorIdentity {
        name: format!("{role}-demo"),
        role: role.to_string(),
    }));
    session.activate();
    Arc::new(ClearanceService::new(
        Arc::new(InMemoryApprovalsGateway::seeded()),
        session,
    ))
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = build_service(&args.role);

    println!("Clearance workflow demo");
    println!("Scope: {}", service.scope().name());

    let summary = service.refresh().map_err(AppError::from)?;
    if summary.degraded.is_empty() {
        println!("Feeds: both healthy, {} applications", summary.total);
    } else {
        println!(
            "Feeds: degraded ({} of 2), {} applications",
            summary.degraded.len(),
            summary.total
        );
    }

    let filter = args
        .status
        .as_deref()
        .map(StatusFilter::parse)
        .unwrap_or(StatusFilter::All);
    render_listing(&service, &args.query, &filter);

    if args.skip_decision {
        return Ok(());
    }
    if !service.scope().is_actionable() {
        println!("\nScope '{}' cannot act on stages", service.scope().name());
        return Ok(());
    }

    let target = service
        .records("", &StatusFilter::All)
        .into_iter()
        .find(|record| {
            record
                .active_stage
                .as_ref()
                .is_some_and(|stage| stage.status == StageStatus::Pending)
        });

    match target {
        Some(record) => {
            let applied = service
                .decide(&record.application_id, DecisionAction::Approve, "")
                .map_err(AppError::from)?;
            println!(
                "\nApproved stage {} for {} ({})",
                applied.stage_id.0, record.student.name, applied.application_id.0
            );
            println!("Listing after optimistic update");
            render_listing(&service, &args.query, &filter);
        }
        None => println!("\nNo pending stage available to decide"),
    }

    Ok(())
}

pub(crate) fn run_history(args: HistoryArgs) -> Result<(), AppError> {
    let service = build_service(&args.role);
    service.refresh().map_err(AppError::from)?;

    // Drive a couple of decisions so the trail has entries to show.
    let records = service.records("", &StatusFilter::All);
    for (index, record) in records.iter().take(2).enumerate() {
        if record
            .active_stage
            .as_ref()
            .is_some_and(|stage| stage.status == StageStatus::Pending)
        {
            let (action, remark) = if index == 0 {
                (DecisionAction::Approve, "")
            } else {
                (DecisionAction::Reject, "dues outstanding")
            };
            service
                .decide(&record.application_id, action, remark)
                .map_err(AppError::from)?;
        }
    }

    let history = service.history().map_err(AppError::from)?;

    if args.csv {
        let mut buffer = Vec::new();
        export_csv(&history, &mut buffer)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        print!("{}", String::from_utf8_lossy(&buffer));
        return Ok(());
    }

    if history.is_empty() {
        println!("Audit trail: empty");
        return Ok(());
    }

    println!("Audit trail");
    for entry in &history {
        let timestamp = entry
            .timestamp
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "- {} | {} ({}) | {} | {}",
            timestamp,
            entry.student_name,
            entry.roll_number,
            entry.action,
            entry.remarks.as_deref().unwrap_or("")
        );
    }

    Ok(())
}

fn render_listing(
    service: &ClearanceService<InMemoryApprovalsGateway>,
    query: &str,
    filter: &StatusFilter,
) {
    let records = service.records(query, filter);
    if records.is_empty() {
        println!("No matching applications");
        return;
    }

    for record in &records {
        let stage_note = match &record.active_stage {
            Some(stage) => format!(
                "{} stage {} ({})",
                stage.department.label(),
                stage.stage_id.0,
                stage.status.label()
            ),
            None => "no stage detail".to_string(),
        };
        println!(
            "- {} | {} ({}) | status {} | {}",
            record.application_id.0,
            record.student.name,
            record.student.roll_number,
            record.status_label,
            stage_note
        );
    }
}
