//! Configuração do ANGLER carregada a partir de `angler.toml`.
//!
//! A struct [`AnglerConfig`] contém os parâmetros do kernel: intervalos
//! mínimos das filas de envio, bytes de "tinta" do desafio e limites do
//! solucionador. Valores ausentes no arquivo usam defaults sensíveis.
//! As variáveis `ANGLER_COMMAND_COOLDOWN_MS` e `ANGLER_CHAT_COOLDOWN_MS`
//! têm precedência sobre o arquivo.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::error::AnglerError;

/// Arquivo de configuração procurado no diretório atual.
pub const DEFAULT_CONFIG_FILE: &str = "angler.toml";

/// Configuração de nível superior carregada de `angler.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnglerConfig {
    /// Intervalo mínimo entre dois comandos reais, em milissegundos.
    #[serde(default = "default_command_cooldown_ms")]
    pub command_cooldown_ms: u64,

    /// Intervalo mínimo entre duas mensagens de chat reais, em milissegundos.
    #[serde(default = "default_chat_cooldown_ms")]
    pub chat_cooldown_ms: u64,

    /// Os dois valores de célula que significam "tinta presente" no raster.
    #[serde(default = "default_ink_values", deserialize_with = "exactly_two")]
    pub ink_values: [u8; 2],

    /// Comprimento esperado do código do desafio.
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Espera máxima por um raster, em milissegundos.
    #[serde(default = "default_challenge_timeout_ms")]
    pub challenge_timeout_ms: u64,

    /// Quantos rasters decodificar antes de desistir.
    #[serde(default = "default_max_decode_attempts")]
    pub max_decode_attempts: u32,
}

// Comandos: 1000ms.
fn default_command_cooldown_ms() -> u64 {
    1000
}

// Chat: 1500ms.
fn default_chat_cooldown_ms() -> u64 {
    1500
}

fn default_ink_values() -> [u8; 2] {
    [34, 119]
}

// O toml trunca arrays longos demais em `[u8; 2]`; lê como Vec e confere.
fn exactly_two<'de, D>(deserializer: D) -> Result<[u8; 2], D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<u8>::deserialize(deserializer)?;
    <[u8; 2]>::try_from(values.as_slice())
        .map_err(|_| de::Error::invalid_length(values.len(), &"exactly two ink bytes"))
}

fn default_code_length() -> usize {
    5
}

fn default_challenge_timeout_ms() -> u64 {
    30_000
}

fn default_max_decode_attempts() -> u32 {
    10
}

impl Default for AnglerConfig {
    fn default() -> Self {
        Self {
            command_cooldown_ms: default_command_cooldown_ms(),
            chat_cooldown_ms: default_chat_cooldown_ms(),
            ink_values: default_ink_values(),
            code_length: default_code_length(),
            challenge_timeout_ms: default_challenge_timeout_ms(),
            max_decode_attempts: default_max_decode_attempts(),
        }
    }
}

impl AnglerConfig {
    /// Carrega a configuração de `angler.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self, AnglerError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Carrega a configuração de um caminho explícito.
    pub fn load_from(path: &Path) -> Result<Self, AnglerError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<AnglerConfig>(&contents)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Aplica as sobrescritas de ambiente, que têm precedência sobre o
    /// arquivo. `get` resolve o nome da variável.
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(ms) = millis(&get, "ANGLER_COMMAND_COOLDOWN_MS") {
            self.command_cooldown_ms = ms;
        }
        if let Some(ms) = millis(&get, "ANGLER_CHAT_COOLDOWN_MS") {
            self.chat_cooldown_ms = ms;
        }
    }

    /// Rejeita combinações que deixariam o solucionador inutilizável.
    pub fn validate(&self) -> Result<(), AnglerError> {
        if self.code_length == 0 {
            return Err(AnglerError::Config("code_length must be at least 1".into()));
        }
        if self.max_decode_attempts == 0 {
            return Err(AnglerError::Config(
                "max_decode_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn command_cooldown(&self) -> Duration {
        Duration::from_millis(self.command_cooldown_ms)
    }

    pub fn chat_cooldown(&self) -> Duration {
        Duration::from_millis(self.chat_cooldown_ms)
    }

    pub fn challenge_timeout(&self) -> Duration {
        Duration::from_millis(self.challenge_timeout_ms)
    }
}

// Valores inválidos são ignorados silenciosamente.
fn millis(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    get(key)?.trim().parse().ok()
}
