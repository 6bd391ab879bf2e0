//! Configuração do scandeck carregada a partir de `scandeck.toml`.
//!
//! A struct [`ScanDeckConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `SCANDECK_ACTIVATION_DELAY_MS` tem precedência sobre o arquivo.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, ScanDeckError};

pub const CONFIG_FILE: &str = "scandeck.toml";
pub const ACTIVATION_DELAY_ENV: &str = "SCANDECK_ACTIVATION_DELAY_MS";

/// Configuração de nível superior carregada de `scandeck.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanDeckConfig {
    /// Atraso em milissegundos antes de uma auditoria PENDING passar a RUNNING.
    #[serde(default = "default_activation_delay_ms")]
    pub activation_delay_ms: u64,

    /// Capacidade do canal de eventos do ciclo de vida.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Filtro padrão do `tracing` quando `RUST_LOG` não está definido.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

// Valor padrão para o atraso de ativação: 2000ms.
fn default_activation_delay_ms() -> u64 {
    2000
}

// Valor padrão para a capacidade do canal de eventos: 64.
fn default_event_buffer() -> usize {
    64
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for ScanDeckConfig {
    fn default() -> Self {
        Self {
            activation_delay_ms: default_activation_delay_ms(),
            event_buffer: default_event_buffer(),
            log_filter: default_log_filter(),
        }
    }
}

impl ScanDeckConfig {
    /// Carrega a configuração de `scandeck.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Carrega a configuração a partir de um caminho explícito.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<ScanDeckConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo de configuração.
        config.apply_delay_override(std::env::var(ACTIVATION_DELAY_ENV).ok())?;

        Ok(config)
    }

    /// Aplica um atraso vindo do ambiente. Valores vazios são ignorados.
    pub fn apply_delay_override(&mut self, raw: Option<String>) -> Result<()> {
        let Some(raw) = raw.filter(|v| !v.trim().is_empty()) else {
            return Ok(());
        };
        self.activation_delay_ms = raw.trim().parse().map_err(|_| {
            ScanDeckError::Config(format!("{ACTIVATION_DELAY_ENV} must be an integer, got {raw:?}"))
        })?;
        Ok(())
    }

    pub fn activation_delay(&self) -> Duration {
        Duration::from_millis(self.activation_delay_ms)
    }
}
