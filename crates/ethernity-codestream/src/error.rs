use thiserror::Error;

/// Erros que podem ocorrer ao construir ou configurar um `CodeStream`
#[derive(Debug, Error)]
pub enum CodeStreamError {
    /// Texto recebido não representa bytes em hexadecimal
    #[error("bytecode hexadecimal inválido: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Configuração inconsistente
    #[error("configuração inválida: {0}")]
    InvalidConfig(String),

    /// Erro propagado do núcleo Ethernity
    #[error(transparent)]
    Core(#[from] ethernity_core::Error),
}

/// Resultado padrão da crate
pub type Result<T> = std::result::Result<T, CodeStreamError>;
