/*!
 * Ethernity Core
 *
 * Tipos e constantes compartilhados para a workspace Ethernity
 */

pub mod error;
pub mod opcodes;

// Re-exportações públicas
pub use error::{Error, Result};
