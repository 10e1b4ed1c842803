//! Loopback link with an emulated module on the far end.
use std::collections::VecDeque;

use crate::responder::{Responder, Variant};

use super::{MockLink, Result, SerialLink};

/// Host-side link whose far end is an in-process [`Responder`].
///
/// Every write lands on the module's input as one burst. The module is given
/// a chance to answer whenever the host polls for input.
pub struct VirtualModule {
    wire: MockLink,
    responder: Responder<MockLink>,
    outbox: VecDeque<u8>,
}

impl VirtualModule {
    pub fn new(variant: Variant) -> Self {
        let wire = MockLink::new();
        let responder = Responder::new(wire.clone(), variant.profile());
        Self {
            wire,
            responder,
            outbox: VecDeque::new(),
        }
    }

    fn pump(&mut self) -> Result<()> {
        while self.wire.pending_input() > 0 {
            self.responder.poll_once()?;
        }
        self.outbox.extend(self.wire.take_written());
        Ok(())
    }
}

impl SerialLink for VirtualModule {
    fn bytes_available(&mut self) -> Result<usize> {
        self.pump()?;
        Ok(self.outbox.len())
    }

    fn read_byte(&mut self) -> Result<u8> {
        self.pump()?;
        self.outbox.pop_front().ok_or(super::SerialError::Timeout)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.wire.push_burst(data);
        Ok(())
    }
}
