//! Interface de terminal do scandeck — spinners e saída colorida.
//!
//! Usa as crates `indicatif` para spinners de progresso e `console` para
//! estilização com cores. O [`ActivationProgress`] acompanha visualmente
//! a espera pelas ativações pendentes.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use scandeck::query::AuditStats;
use scandeck::state_machine::{Audit, AuditStatus, Container, ContainerStatus};

/// Spinner exibido enquanto auditorias aguardam a ativação.
pub struct ActivationProgress {
    pb: ProgressBar,
}

impl ActivationProgress {
    /// Inicia o spinner com a mensagem fornecida.
    pub fn start(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { pb }
    }

    /// Finaliza e remove o spinner do terminal.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

// Verde para sucesso, vermelho para falha, amarelo para estados em andamento.
fn audit_style(status: AuditStatus) -> Style {
    match status {
        AuditStatus::Completed => Style::new().green().bold(),
        AuditStatus::Failed => Style::new().red().bold(),
        AuditStatus::Cancelled => Style::new().dim(),
        AuditStatus::Pending | AuditStatus::Running => Style::new().yellow(),
    }
}

fn container_style(status: ContainerStatus) -> Style {
    match status {
        ContainerStatus::Completed => Style::new().green(),
        ContainerStatus::Failed => Style::new().red(),
        ContainerStatus::Terminated => Style::new().dim(),
        ContainerStatus::Creating | ContainerStatus::Running => Style::new().cyan(),
    }
}

/// Imprime uma auditoria e seu container em uma linha.
pub fn print_pair(audit: &Audit, container: Option<&Container>) {
    let container_part = match container {
        Some(c) => format!(
            "{} {} [{}]",
            c.id,
            container_style(c.status).apply_to(c.status.to_string()),
            c.image
        ),
        None => "-".to_string(),
    };
    // Display dos enums ignora largura; o preenchimento é feito na string.
    let status = format!("{:<10}", audit.status.to_string());
    println!(
        "  {:<16} {} {:<24} {}",
        audit.audit_type.to_string(),
        audit_style(audit.status).apply_to(status),
        audit.target,
        container_part
    );
}

/// Imprime a tabela de auditorias com o container correspondente.
pub fn print_audits(rows: &[(Audit, Option<Container>)]) {
    let header = Style::new().bold();
    println!();
    println!("{}", header.apply_to("─── Audits ───"));
    for (audit, container) in rows {
        print_pair(audit, container.as_ref());
    }
}

/// Imprime o resumo agregado por status.
pub fn print_stats(stats: &AuditStats) {
    println!();
    println!("{}", Style::new().bold().apply_to("─── Stats ───"));
    println!(
        "  total={} pending={} running={} completed={} failed={} cancelled={} active_containers={}",
        stats.total,
        stats.pending,
        stats.running,
        stats.completed,
        stats.failed,
        stats.cancelled,
        stats.active_containers
    );
}

/// Imprime a auditoria formatada em JSON.
pub fn print_json(audit: &Audit) {
    println!(
        "{}",
        serde_json::to_string_pretty(audit).unwrap_or_default()
    );
}
