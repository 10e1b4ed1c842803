//! Scripted in-memory serial link used by tests and the virtual module.
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Result, SerialError, SerialLink};

#[derive(Debug, Default)]
struct MockState {
    // Each burst is delivered back to back; an exhausted burst reports zero
    // available bytes once before it is dropped.
    bursts: VecDeque<VecDeque<u8>>,
    // Released as a burst, one per write
    replies: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    fail_reads: bool,
}

/// Cloneable handle to a shared mock serial line.
///
/// Clone one end into the code under test and keep the other to push input
/// and inspect output.
#[derive(Debug, Clone, Default)]
pub struct MockLink {
    state: Arc<Mutex<MockState>>,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned lock only means a test panicked while holding it.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue bytes that arrive back to back, followed by a gap on the line.
    pub fn push_burst(&self, data: impl AsRef<[u8]>) {
        let data = data.as_ref();
        if data.is_empty() {
            return;
        }
        self.lock().bursts.push_back(data.iter().copied().collect());
    }

    /// Queue a burst that only arrives after the next unanswered write.
    pub fn queue_reply(&self, data: impl AsRef<[u8]>) {
        self.lock().replies.push_back(data.as_ref().to_vec());
    }

    /// Bytes still waiting to be read, across all queued bursts.
    pub fn pending_input(&self) -> usize {
        self.lock().bursts.iter().map(VecDeque::len).sum()
    }

    /// Everything written to the link so far.
    pub fn written(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    pub fn written_string(&self) -> String {
        String::from_utf8_lossy(&self.lock().written).into_owned()
    }

    /// Drain and return everything written so far.
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.lock().written)
    }

    /// Make subsequent reads fail, simulating an unplugged adapter.
    pub fn fail_reads(&self) {
        self.lock().fail_reads = true;
    }
}

impl SerialLink for MockLink {
    fn bytes_available(&mut self) -> Result<usize> {
        let mut state = self.lock();
        if state.fail_reads {
            return Err(SerialError::IoError(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock link closed",
            )));
        }
        match state.bursts.front().map(VecDeque::len) {
            Some(0) => {
                state.bursts.pop_front();
                Ok(0)
            }
            Some(len) => Ok(len),
            None => Ok(0),
        }
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut state = self.lock();
        state
            .bursts
            .front_mut()
            .and_then(VecDeque::pop_front)
            .ok_or(SerialError::Timeout)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.lock();
        state.written.extend_from_slice(data);
        let reply = state.replies.pop_front();
        if let Some(reply) = reply.filter(|r| !r.is_empty()) {
            state.bursts.push_back(reply.into());
        }
        Ok(())
    }
}
