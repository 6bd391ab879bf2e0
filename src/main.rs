mod cli;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use tracing::info;
use tracing_subscriber::EnvFilter;

use scandeck::AuditOrchestrator;
use scandeck::config::ScanDeckConfig;
use scandeck::state_machine::{
    Audit, AuditLanguage, AuditResults, CompletionOutcome, Container, Port,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ScanDeckConfig::load().context("failed to load scandeck.toml")?;
    if let Some(delay_ms) = cli.delay_ms {
        config.activation_delay_ms = delay_ms;
    }
    init_tracing(&config, cli.verbose);

    let orch = AuditOrchestrator::new(&config);

    match cli.command {
        Command::PortScan { target, wait } => {
            let audit = orch.start_port_scan(&target).await?;
            finish_command(&orch, audit, wait).await;
        }
        Command::DependencyScan {
            language,
            project_path,
            wait,
        } => {
            let audit = orch
                .start_dependency_scan(language.into(), &project_path)
                .await?;
            finish_command(&orch, audit, wait).await;
        }
        Command::Demo => run_demo(&orch).await?,
        Command::Serve => {
            info!(
                delay_ms = config.activation_delay_ms,
                "serving JSON requests on stdin"
            );
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            scandeck::api::serve(&orch, stdin, tokio::io::stdout()).await?;
        }
    }

    Ok(())
}

// Logs go to stderr so `serve` keeps stdout for responses. RUST_LOG wins
// over the configured filter.
fn init_tracing(config: &ScanDeckConfig, verbose: bool) {
    let default_filter = if verbose {
        "debug".to_string()
    } else {
        config.log_filter.clone()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn finish_command(orch: &AuditOrchestrator, audit: Audit, wait: bool) {
    let audit = if wait {
        let progress = wait_spinner(orch);
        orch.settle().await;
        progress.finish();
        orch.get_audit(&audit.id).await.unwrap_or(audit)
    } else {
        audit
    };
    ui::print_json(&audit);
}

fn wait_spinner(orch: &AuditOrchestrator) -> ui::ActivationProgress {
    ui::ActivationProgress::start(&format!(
        "waiting {}ms for activation",
        orch.activation_delay().as_millis()
    ))
}

async fn rows(orch: &AuditOrchestrator) -> Vec<(Audit, Option<Container>)> {
    let mut rows = Vec::new();
    for audit in orch.list_audits(None).await {
        let container = orch.get_container(&audit.container_id).await;
        rows.push((audit, container));
    }
    rows
}

/// Scripted walk through the lifecycle: start a mix of scans, cancel one
/// inside the activation window, let the rest activate, then report one
/// completion the way a scanning backend would.
async fn run_demo(orch: &AuditOrchestrator) -> Result<()> {
    let gateway = orch.start_port_scan("10.0.0.5").await?;
    let web = orch.start_port_scan("web-server").await?;
    orch.start_dependency_scan(AuditLanguage::Nodejs, "/app").await?;
    orch.start_dependency_scan(AuditLanguage::Python, "/srv/api").await?;

    orch.cancel_audit(&web.id).await?;
    ui::print_audits(&rows(orch).await);

    let progress = wait_spinner(orch);
    orch.settle().await;
    progress.finish();

    let results = AuditResults {
        summary: Some("Port scan completed successfully".into()),
        details: Some("Scanned 1000 ports, found 3 open".into()),
        ports: [(22, "ssh"), (80, "http"), (443, "https")]
            .into_iter()
            .map(|(number, service)| Port {
                number,
                protocol: "TCP".into(),
                state: "open".into(),
                service: Some(service.into()),
            })
            .collect(),
        ..Default::default()
    };
    orch.complete_audit(
        &gateway.id,
        CompletionOutcome::Completed {
            results: Some(results),
        },
    )
    .await?;

    // A second cancel on a finished audit is a no-op.
    let cancelled_again = orch.cancel_audit(&gateway.id).await?;
    info!(cancelled_again, "cancel after completion");

    ui::print_audits(&rows(orch).await);
    ui::print_stats(&orch.audit_stats().await);

    Ok(())
}
