use crate::infra::{seed_demo_tenant, Services};
use clap::Args;
use site_safety::config::AppConfig;
use site_safety::error::AppError;
use site_safety::integrations::Integrations;
use site_safety::persistence::MemoryGateway;
use site_safety::workflows::inspections::{StepStatus, SubmitInspectionRequest};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Hours to log against the project when the inspection is finalized
    #[arg(long, default_value_t = 2.5)]
    pub(crate) hours: f64,
    /// Recipient for the finalized report (repeatable)
    #[arg(long = "contact")]
    pub(crate) contact_emails: Vec<String>,
    /// Skip the weekly summary portion of the demo
    #[arg(long)]
    pub(crate) skip_summary: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        hours,
        contact_emails,
        skip_summary,
    } = args;

    let config = AppConfig::load()?;
    let integrations = Integrations::from_config(&config.integrations, &config.workflow)?;
    let gateway = Arc::new(MemoryGateway::new());
    let demo = seed_demo_tenant(&gateway)?;
    let services = Services::build(gateway, integrations, config.workflow.clone());

    println!("Site safety demo");
    println!(
        "- Tenant {} | admin {} | inspector {}",
        demo.tenant, demo.admin, demo.inspector
    );

    let detail = match services.records.get(demo.tenant, demo.inspection) {
        Ok(detail) => detail,
        Err(err) => {
            println!("  Inspection unavailable: {}", err);
            return Ok(());
        }
    };
    println!(
        "- Draft inspection {} with {} findings ({} issues)",
        detail.inspection.id,
        detail.findings.len(),
        detail
            .findings
            .iter()
            .filter(|finding| finding.is_issue())
            .count()
    );

    let request = SubmitInspectionRequest::finalize(contact_emails, Some(hours));
    let outcome = match services
        .submissions
        .submit(demo.tenant, demo.inspection, demo.inspector, request)
        .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            println!("  Submission rejected: {}", err);
            return Ok(());
        }
    };
    println!("\nFinal submission -> {}", outcome.message);
    for report in &outcome.steps {
        let label = match report.finding_id {
            Some(finding) => format!("{} [{}]", report.step.label(), finding),
            None => report.step.label().to_string(),
        };
        match &report.status {
            StepStatus::Completed { detail } => println!("  - {label}: completed ({detail})"),
            StepStatus::Skipped { reason } => println!("  - {label}: skipped ({reason})"),
            StepStatus::Failed { error } => println!("  - {label}: FAILED ({error})"),
        }
    }

    match services.actions.open_for_client(demo.tenant, demo.client) {
        Ok(actions) => {
            println!("\nOpen corrective actions ({})", actions.len());
            for action in actions {
                println!(
                    "  - {} (due {}, owner {})",
                    action.description,
                    action.due_date.format("%Y-%m-%d"),
                    action.responsible_name
                );
            }
        }
        Err(err) => println!("  Actions unavailable: {}", err),
    }

    if skip_summary {
        return Ok(());
    }

    println!("\nWeekly summaries");
    match services.summaries.send_all(demo.tenant).await {
        Ok(summaries) => match serde_json::to_string_pretty(&summaries) {
            Ok(json) => println!("{}", json),
            Err(err) => println!("  Summary payload unavailable: {}", err),
        },
        Err(err) => println!("  Weekly summary failed: {}", err),
    }

    Ok(())
}
