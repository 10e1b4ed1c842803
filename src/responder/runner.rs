use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::serial::{Result, SerialLink};

use super::dispatch::{respond, Reply};
use super::profile::ModuleProfile;

pub const DEFAULT_IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Emulated module sitting on the far end of a serial link.
///
/// Bytes are collected while the link reports them as available. Once the
/// link goes quiet the collected text is treated as one command and answered
/// with exactly one reply (the echo debugger answers each line of it
/// instead). There is no delimiter: a command split by a pause on the wire
/// is seen as two commands.
pub struct Responder<L: SerialLink> {
    link: L,
    profile: ModuleProfile,
    pending: Vec<u8>,
    idle_sleep: Duration,
    replies_sent: u64,
}

impl<L: SerialLink> Responder<L> {
    pub fn new(link: L, profile: ModuleProfile) -> Self {
        Self {
            link,
            profile,
            pending: Vec::new(),
            idle_sleep: DEFAULT_IDLE_SLEEP,
            replies_sent: 0,
        }
    }

    /// Pause between polls while the line is idle. Zero busy-polls.
    pub fn with_idle_sleep(mut self, idle_sleep: Duration) -> Self {
        self.idle_sleep = idle_sleep;
        self
    }

    pub fn replies_sent(&self) -> u64 {
        self.replies_sent
    }

    /// One pass of the read loop.
    ///
    /// Drains the bytes available right now and, if anything was collected,
    /// answers it. Returns the replies that were written, in order.
    pub fn poll_once(&mut self) -> Result<Vec<Reply>> {
        while self.link.bytes_available()? > 0 {
            self.pending.push(self.link.read_byte()?);
        }

        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        // Byte-per-char, like a UART sketch appending to a String.
        let token: String = self.pending.drain(..).map(char::from).collect();
        log::debug!("RX: {:?}", token);

        let replies = respond(&self.profile, &token);
        for reply in &replies {
            if !reply.is_ok() {
                log::debug!("Rejected command {:?}: {}", token, reply);
            }
            self.link.write_all(&reply.to_wire())?;
            self.replies_sent += 1;
            log::debug!("TX: {:?}", reply.to_string());
        }
        Ok(replies)
    }

    /// Write the profile's startup line, if it has one.
    pub fn announce(&mut self) -> Result<()> {
        if let Some(banner) = self.profile.banner() {
            log::info!("{}", banner);
            self.link.write_all(format!("{}\n", banner).as_bytes())?;
        }
        Ok(())
    }

    /// Serve forever. Only returns when the link fails.
    pub fn run(&mut self) -> Result<()> {
        let never = AtomicBool::new(false);
        self.run_until(&never)
    }

    /// Serve until `stop` is set or the link fails.
    pub fn run_until(&mut self, stop: &AtomicBool) -> Result<()> {
        self.announce()?;
        log::info!("Emulating {} module", self.profile.variant);

        while !stop.load(Ordering::Relaxed) {
            if self.poll_once()?.is_empty() && !self.idle_sleep.is_zero() {
                std::thread::sleep(self.idle_sleep);
            }
        }

        log::info!("Emulator stopped after {} replies", self.replies_sent);
        Ok(())
    }
}
