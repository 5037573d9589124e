use std::sync::Arc;

use parking_lot::Mutex;

use crate::stream::CodeStream;

/// `CodeStream` protegido por um único lock exclusivo.
///
/// Cursor e memória de classificação mudam juntos, então todo acesso passa
/// pelo mesmo mutex. Para leituras independentes por thread prefira
/// `CodeStream::clone`.
#[derive(Debug, Clone)]
pub struct SharedCodeStream {
    inner: Arc<Mutex<CodeStream>>,
}

impl SharedCodeStream {
    pub fn new(stream: CodeStream) -> Self {
        Self {
            inner: Arc::new(Mutex::new(stream)),
        }
    }

    pub fn is_valid_opcode(&self, position: usize) -> bool {
        self.inner.lock().is_valid_opcode(position)
    }

    pub fn next_opcode(&self) -> u8 {
        self.inner.lock().next_opcode()
    }

    pub fn position(&self) -> usize {
        self.inner.lock().position()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Executa várias operações sob o mesmo lock
    pub fn with_stream<R>(&self, f: impl FnOnce(&mut CodeStream) -> R) -> R {
        let mut stream = self.inner.lock();
        f(&mut stream)
    }
}

impl From<CodeStream> for SharedCodeStream {
    fn from(stream: CodeStream) -> Self {
        Self::new(stream)
    }
}
