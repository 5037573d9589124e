use ethernity_core::opcodes::STOP;
use serde::{Deserialize, Serialize};

use crate::error::{CodeStreamError, Result};

/// Configuração de um `CodeStream`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeStreamConfig {
    /// Valor devolvido ao ler além do fim do código
    pub terminator: u8,
    /// Classifica todas as posições já na construção
    pub eager_analysis: bool,
    /// Tamanho máximo aceito para o bytecode
    pub max_code_size: Option<usize>,
}

impl Default for CodeStreamConfig {
    fn default() -> Self {
        Self {
            terminator: STOP,
            eager_analysis: false,
            max_code_size: None,
        }
    }
}

impl CodeStreamConfig {
    /// Carrega e valida a configuração a partir de JSON
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| ethernity_core::Error::DecodeError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_code_size == Some(0) {
            return Err(CodeStreamError::InvalidConfig(
                "max_code_size deve ser maior que zero".to_string(),
            ));
        }
        Ok(())
    }
}
