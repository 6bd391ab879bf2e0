//! Interface de linha de comando do scandeck baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (port-scan,
//! dependency-scan, demo, serve) e flags globais (--delay-ms, --verbose).

use clap::{Parser, Subcommand, ValueEnum};
use scandeck::state_machine::AuditLanguage;

/// scandeck — Orquestrador do ciclo de vida de auditorias de segurança.
#[derive(Debug, Parser)]
#[command(name = "scandeck", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Atraso (ms) antes de uma auditoria pendente entrar em execução.
    #[arg(long, global = true)]
    pub delay_ms: Option<u64>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Linguagem aceita pela CLI, mapeada para [`AuditLanguage`] internamente.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LanguageArg {
    /// Projetos Python (pip-audit).
    Python,
    /// Projetos Node.js (osv-scanner).
    Nodejs,
}

impl From<LanguageArg> for AuditLanguage {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::Python => AuditLanguage::Python,
            LanguageArg::Nodejs => AuditLanguage::Nodejs,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inicia um port scan contra o alvo informado.
    PortScan {
        /// Host ou endereço a ser escaneado.
        target: String,

        /// Aguarda a ativação antes de imprimir o resultado.
        #[arg(long)]
        wait: bool,
    },

    /// Inicia uma auditoria de dependências de um projeto.
    DependencyScan {
        /// Ecossistema do projeto.
        #[arg(long, value_enum)]
        language: LanguageArg,

        /// Caminho do projeto.
        project_path: String,

        /// Aguarda a ativação antes de imprimir o resultado.
        #[arg(long)]
        wait: bool,
    },

    /// Executa a demonstração embutida do ciclo de vida.
    Demo,

    /// Atende requisições JSON (uma por linha) em stdin/stdout.
    Serve,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_port_scan_subcommand() {
        let cli = Cli::parse_from(["scandeck", "port-scan", "10.0.0.5"]);
        match cli.command {
            Command::PortScan { target, wait } => {
                assert_eq!(target, "10.0.0.5");
                assert!(!wait);
            }
            _ => panic!("expected PortScan command"),
        }
    }

    #[test]
    fn cli_parses_dependency_scan_subcommand() {
        let cli = Cli::parse_from([
            "scandeck",
            "dependency-scan",
            "--language",
            "nodejs",
            "/app",
            "--wait",
        ]);
        match cli.command {
            Command::DependencyScan {
                language,
                project_path,
                wait,
            } => {
                assert_eq!(AuditLanguage::from(language), AuditLanguage::Nodejs);
                assert_eq!(project_path, "/app");
                assert!(wait);
            }
            _ => panic!("expected DependencyScan command"),
        }
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from(["scandeck", "--delay-ms", "50", "--verbose", "demo"]);
        assert!(cli.verbose);
        assert_eq!(cli.delay_ms, Some(50));
        assert!(matches!(cli.command, Command::Demo));
    }

    #[test]
    fn cli_rejects_unknown_language() {
        let parsed = Cli::try_parse_from([
            "scandeck",
            "dependency-scan",
            "--language",
            "ruby",
            "/app",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
