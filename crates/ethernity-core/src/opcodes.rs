/*!
 * Ethernity Opcodes
 *
 * Valores de opcodes EVM usados na análise de bytecode
 */

/// Interrompe a execução
pub const STOP: u8 = 0x00;
pub const ADD: u8 = 0x01;
pub const JUMP: u8 = 0x56;
pub const JUMPI: u8 = 0x57;
pub const JUMPDEST: u8 = 0x5b;
/// Primeiro opcode da família PUSH (1 byte de dados)
pub const PUSH1: u8 = 0x60;
pub const PUSH2: u8 = 0x61;
pub const PUSH4: u8 = 0x63;
/// Último opcode da família PUSH (32 bytes de dados)
pub const PUSH32: u8 = 0x7f;

/// Maior quantidade de bytes de dados carregada por um PUSH
pub const MAX_PUSH_WIDTH: usize = 32;

/// Verifica se o opcode pertence à família `PUSH1..=PUSH32`
pub fn is_push(opcode: u8) -> bool {
    (PUSH1..=PUSH32).contains(&opcode)
}

/// Quantidade de bytes de dados que seguem o opcode, se for um PUSH
pub fn push_width(opcode: u8) -> Option<usize> {
    if is_push(opcode) {
        Some((opcode - PUSH1) as usize + 1)
    } else {
        None
    }
}
