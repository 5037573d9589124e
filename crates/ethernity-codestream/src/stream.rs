use std::collections::HashSet;
use std::ops::{Deref, DerefMut, Index};

use bytes::Bytes;
use ethernity_core::opcodes::{self, MAX_PUSH_WIDTH, STOP};
use tracing::{debug, trace};

use crate::config::CodeStreamConfig;
use crate::error::Result;

/// Estatísticas da classificação de opcodes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationStats {
    /// Consultas respondidas pela memória
    pub memo_hits: usize,
    /// Varreduras para trás efetivamente executadas
    pub scans: usize,
    /// Posições memorizadas como opcode válido
    pub valid: usize,
    /// Posições memorizadas como dado de PUSH
    pub invalid: usize,
}

/// Cursor sobre bytecode imutável com classificação de opcodes válidos.
///
/// Ler além do fim devolve o terminador configurado (`STOP` por padrão),
/// de modo que sair do código equivale a uma parada explícita.
///
/// `Clone` compartilha o buffer e duplica a memória de classificação,
/// permitindo um cursor independente por thread.
#[derive(Debug, Clone)]
pub struct CodeStream {
    code: Bytes,
    length: usize,
    pc: usize,
    terminator: u8,
    valid_positions: HashSet<usize>,
    invalid_positions: HashSet<usize>,
    stats: ClassificationStats,
}

impl CodeStream {
    /// Cria um cursor sobre o bytecode, sem nenhuma validação
    pub fn new(code: impl Into<Bytes>) -> Self {
        Self::build(code.into(), STOP)
    }

    /// Cria um cursor aplicando a configuração informada
    pub fn with_config(code: impl Into<Bytes>, config: &CodeStreamConfig) -> Result<Self> {
        config.validate()?;
        let code = code.into();
        if let Some(limit) = config.max_code_size {
            if code.len() > limit {
                return Err(ethernity_core::Error::ValidationError(format!(
                    "bytecode com {} bytes excede o limite de {}",
                    code.len(),
                    limit
                ))
                .into());
            }
        }

        let mut stream = Self::build(code, config.terminator);
        if config.eager_analysis {
            stream.analyze();
        }
        Ok(stream)
    }

    /// Cria um cursor a partir de bytecode em hexadecimal (prefixo `0x` opcional)
    pub fn from_hex(hex_code: &str) -> Result<Self> {
        Self::from_hex_with_config(hex_code, &CodeStreamConfig::default())
    }

    /// Igual a `from_hex`, aplicando a configuração informada
    pub fn from_hex_with_config(hex_code: &str, config: &CodeStreamConfig) -> Result<Self> {
        let code = hex::decode(hex_code.trim().trim_start_matches("0x"))?;
        Self::with_config(code, config)
    }

    fn build(code: Bytes, terminator: u8) -> Self {
        let length = code.len();
        debug!(length, terminator, "code stream criado");
        Self {
            code,
            length,
            pc: 0,
            terminator,
            valid_positions: HashSet::new(),
            invalid_positions: HashSet::new(),
            stats: ClassificationStats::default(),
        }
    }

    /// Lê até `size` bytes a partir da posição atual e avança o cursor
    pub fn read(&mut self, size: usize) -> &[u8] {
        let start = self.pc;
        let end = start.saturating_add(size).min(self.length);
        self.pc = end;
        &self.code[start..end]
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Byte na posição absoluta `index`.
    ///
    /// # Panics
    ///
    /// Se `index >= len()`.
    pub fn byte_at(&self, index: usize) -> u8 {
        self.code[index]
    }

    /// Versão verificada de `byte_at`
    pub fn get(&self, index: usize) -> Option<u8> {
        self.code.get(index).copied()
    }

    /// Bytecode completo
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn position(&self) -> usize {
        self.pc
    }

    /// Move o cursor; posições além do fim são limitadas a `len()`
    pub fn set_position(&mut self, value: usize) {
        self.pc = value.min(self.length);
    }

    /// Lê o próximo opcode; no fim do código devolve o terminador sem avançar
    pub fn next_opcode(&mut self) -> u8 {
        if self.pc >= self.length {
            return self.terminator;
        }
        let opcode = self.code[self.pc];
        self.pc += 1;
        opcode
    }

    /// Próximo opcode sem mover o cursor
    pub fn peek(&mut self) -> u8 {
        let current_pc = self.pc;
        let opcode = self.next_opcode();
        self.pc = current_pc;
        opcode
    }

    /// Move o cursor temporariamente para `position`.
    ///
    /// A posição anterior é restaurada quando o guard sai de escopo, inclusive
    /// durante um panic. O guard dá acesso ao próprio stream, então pode ser
    /// aninhado.
    pub fn seek(&mut self, position: usize) -> SeekGuard<'_> {
        let anchor = self.pc;
        self.set_position(position);
        SeekGuard { stream: self, anchor }
    }

    /// Indica se `position` inicia uma instrução real, e não um byte de dados
    /// de um PUSH anterior.
    ///
    /// O resultado é memorizado: cada posição é varrida no máximo uma vez.
    pub fn is_valid_opcode(&mut self, position: usize) -> bool {
        if position >= self.length {
            return false;
        }
        match self.memoized(position) {
            Some(valid) => valid,
            None => self.classify(position),
        }
    }

    /// Classifica todas as posições do código
    pub fn analyze(&mut self) {
        for position in 0..self.length {
            self.is_valid_opcode(position);
        }
        debug!(
            valid = self.stats.valid,
            invalid = self.stats.invalid,
            "análise completa do bytecode"
        );
    }

    /// Posição do PUSH final cujos dados ultrapassam o fim do código, se houver
    pub fn truncated_push(&mut self) -> Option<usize> {
        let code = self.code.clone();
        let push_position = disqualifier_candidates(&code, self.length)
            .find(|&earlier| self.is_valid_opcode(earlier));
        if let Some(push_position) = push_position {
            debug!(push_position, length = self.length, "PUSH final sem todos os bytes de dados");
        }
        push_position
    }

    pub fn stats(&self) -> ClassificationStats {
        self.stats
    }

    fn memoized(&mut self, position: usize) -> Option<bool> {
        let known = if self.invalid_positions.contains(&position) {
            Some(false)
        } else if self.valid_positions.contains(&position) {
            Some(true)
        } else {
            None
        };
        if known.is_some() {
            self.stats.memo_hits += 1;
        }
        known
    }

    fn memoize(&mut self, position: usize, valid: bool) {
        trace!(position, valid, "posição classificada");
        if valid {
            self.valid_positions.insert(position);
            self.stats.valid += 1;
        } else {
            self.invalid_positions.insert(position);
            self.stats.invalid += 1;
        }
    }

    /// Varredura para trás com pilha explícita.
    ///
    /// Cada PUSH candidato ainda não classificado empilha sua própria
    /// varredura; a pilha fica no heap, então trechos longos de PUSH não
    /// esgotam a pilha da thread.
    fn classify(&mut self, position: usize) -> bool {
        let code = self.code.clone();
        self.stats.scans += 1;
        let mut pending = vec![PendingScan::new(position)];
        // Resultado da última varredura concluída (ou memorizada), ainda não
        // consumido pela varredura do topo
        let mut resolved: Option<bool> = None;

        while let Some(scan) = pending.last_mut() {
            if resolved.take() == Some(true) {
                // o candidato é um PUSH vivo: a posição é dado
                let shadowed = scan.position;
                pending.pop();
                self.memoize(shadowed, false);
                resolved = Some(false);
                continue;
            }

            match scan.next_candidate(&code) {
                Some(earlier) => match self.memoized(earlier) {
                    Some(valid) => resolved = Some(valid),
                    None => {
                        self.stats.scans += 1;
                        pending.push(PendingScan::new(earlier));
                    }
                },
                None => {
                    let live = scan.position;
                    pending.pop();
                    self.memoize(live, true);
                    resolved = Some(true);
                }
            }
        }

        resolved == Some(true)
    }
}

/// Varredura em andamento de uma posição, do byte mais distante ao mais próximo
struct PendingScan {
    position: usize,
    bytes_back: usize,
}

impl PendingScan {
    fn new(position: usize) -> Self {
        Self {
            position,
            bytes_back: position.min(MAX_PUSH_WIDTH),
        }
    }

    fn next_candidate(&mut self, code: &[u8]) -> Option<usize> {
        while self.bytes_back > 0 {
            let bytes_back = self.bytes_back;
            self.bytes_back -= 1;
            let earlier = self.position - bytes_back;
            if covers(code[earlier], bytes_back) {
                return Some(earlier);
            }
        }
        None
    }
}

/// PUSH em `opcode` alcança um byte `bytes_back` posições à frente
fn covers(opcode: u8, bytes_back: usize) -> bool {
    matches!(opcodes::push_width(opcode), Some(width) if width >= bytes_back)
}

/// Posições até 32 bytes antes de `position` contendo um PUSH largo o
/// bastante para alcançá-la, da mais distante para a mais próxima.
fn disqualifier_candidates(code: &[u8], position: usize) -> impl Iterator<Item = usize> + '_ {
    let deepest_lookback = position.min(MAX_PUSH_WIDTH);
    (1..=deepest_lookback)
        .rev()
        .filter(move |&bytes_back| covers(code[position - bytes_back], bytes_back))
        .map(move |bytes_back| position - bytes_back)
}

impl Index<usize> for CodeStream {
    type Output = u8;

    fn index(&self, index: usize) -> &u8 {
        &self.code[index]
    }
}

/// Iterador infinito de opcodes: após o fim devolve sempre o terminador
impl Iterator for CodeStream {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        Some(self.next_opcode())
    }
}

/// Guard devolvido por [`CodeStream::seek`]
#[derive(Debug)]
pub struct SeekGuard<'a> {
    stream: &'a mut CodeStream,
    anchor: usize,
}

impl SeekGuard<'_> {
    /// Posição que será restaurada
    pub fn anchor(&self) -> usize {
        self.anchor
    }
}

impl Deref for SeekGuard<'_> {
    type Target = CodeStream;

    fn deref(&self) -> &CodeStream {
        &*self.stream
    }
}

impl DerefMut for SeekGuard<'_> {
    fn deref_mut(&mut self) -> &mut CodeStream {
        &mut *self.stream
    }
}

impl Drop for SeekGuard<'_> {
    fn drop(&mut self) {
        self.stream.pc = self.anchor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethernity_core::opcodes::{ADD, PUSH1, PUSH2, PUSH32};

    #[test]
    fn memo_sets_stay_disjoint() {
        let mut code = vec![PUSH32];
        code.extend_from_slice(&[PUSH1; 40]);
        code.extend_from_slice(&[PUSH2, 0x00, 0x00, ADD]);
        let mut stream = CodeStream::new(code);

        for position in (0..stream.len()).rev() {
            stream.is_valid_opcode(position);
        }
        assert!(stream.valid_positions.is_disjoint(&stream.invalid_positions));
        assert_eq!(
            stream.valid_positions.len() + stream.invalid_positions.len(),
            stream.len()
        );
    }

    #[test]
    fn repeated_query_hits_memo_without_rescanning() {
        let mut stream = CodeStream::new(vec![PUSH1, 0x01, ADD]);

        assert!(!stream.is_valid_opcode(1));
        let after_first = stream.stats();
        // posição 1 e o PUSH1 na posição 0
        assert_eq!(after_first.scans, 2);

        assert!(!stream.is_valid_opcode(1));
        let after_second = stream.stats();
        assert_eq!(after_second.scans, after_first.scans);
        assert_eq!(after_second.memo_hits, after_first.memo_hits + 1);
    }

    #[test]
    fn out_of_range_query_is_not_memoized() {
        let mut stream = CodeStream::new(vec![ADD]);
        assert!(!stream.is_valid_opcode(1));
        assert!(!stream.is_valid_opcode(usize::MAX));
        assert_eq!(stream.stats(), ClassificationStats::default());
    }

    #[test]
    fn pending_scan_walks_the_same_candidates() {
        let code = [PUSH32, PUSH2, PUSH1, ADD];
        let mut scan = PendingScan::new(3);
        let found: Vec<usize> = std::iter::from_fn(|| scan.next_candidate(&code)).collect();
        assert_eq!(found, disqualifier_candidates(&code, 3).collect::<Vec<_>>());
    }

    #[test]
    fn cold_query_in_long_push_run_scans_each_position_once() {
        let mut stream = CodeStream::new(vec![PUSH1; 5]);
        assert!(stream.is_valid_opcode(4));
        let stats = stream.stats();
        // cada posição de 4 a 0 é varrida uma única vez
        assert_eq!(stats.scans, 5);
        assert_eq!(stats.valid, 3);
        assert_eq!(stats.invalid, 2);
        assert!(stream.valid_positions.is_disjoint(&stream.invalid_positions));
    }

    #[test]
    fn candidates_are_listed_farthest_first() {
        let code = [PUSH32, PUSH2, PUSH1, ADD];
        let found: Vec<usize> = disqualifier_candidates(&code, 3).collect();
        assert_eq!(found, vec![0, 1, 2]);

        // PUSH1 a dois bytes de distância não alcança a posição
        let found: Vec<usize> = disqualifier_candidates(&[PUSH1, ADD, ADD], 2).collect();
        assert!(found.is_empty());
    }
}
