/*!
 * Ethernity CodeStream
 *
 * Cursor sobre bytecode EVM imutável. Além da leitura sequencial e do
 * acesso posicional, classifica cada posição como opcode real ou como
 * dado embutido por um PUSH anterior, informação usada pela validação
 * de destinos de salto.
 */

mod config;
mod error;
mod shared;
mod stream;

// Re-exportações públicas
pub use config::*;
pub use error::*;
pub use shared::*;
pub use stream::*;
