use crate::{
    error::Error,
    transport::{LogLine, Transport},
};
use parking_lot::Mutex;

/// Keeps every line in memory. Intended for collaborators' tests.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    lines: Mutex<Vec<LogLine>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.lock().clone()
    }

    /// Drains the captured lines.
    pub fn take(&self) -> Vec<LogLine> {
        std::mem::take(&mut *self.lines.lock())
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Transport for MemoryTransport {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn write(&self, line: &LogLine) -> Result<(), Error> {
        self.lines.lock().push(line.clone());
        Ok(())
    }
}
