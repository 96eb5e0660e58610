//! Free-running tick counter and the latch that turns it into a refresh cadence.

use core::sync::atomic::{AtomicU8, Ordering};

/// Counter advanced by a single periodic producer (interrupt or timer task) and read
/// from the main context. Wraps to zero after `modulus - 1`.
pub struct TickCounter {
    count: AtomicU8,
    modulus: u8,
}

impl TickCounter {
    pub const fn new(modulus: u8) -> Self {
        Self {
            count: AtomicU8::new(0),
            modulus,
        }
    }

    /// Advance by one tick and return the new count.
    ///
    /// Only one context may call this; readers are free to race with it.
    pub fn advance(&self) -> u8 {
        let current = self.count.load(Ordering::Relaxed);
        let next = if current.saturating_add(1) >= self.modulus {
            0
        } else {
            current + 1
        };
        self.count.store(next, Ordering::Release);
        next
    }

    pub fn current(&self) -> u8 {
        self.count.load(Ordering::Acquire)
    }

    pub const fn modulus(&self) -> u8 {
        self.modulus
    }
}

/// Fires once each time the counter enters `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RefreshGate {
    slot: u8,
    fired: bool,
}

impl RefreshGate {
    pub const fn new(slot: u8) -> Self {
        Self { slot, fired: false }
    }

    /// `true` on the first poll that sees `count == slot`; re-arms once the count moves on.
    pub fn poll(&mut self, count: u8) -> bool {
        if count != self.slot {
            self.fired = false;
            return false;
        }
        let due = !self.fired;
        self.fired = true;
        due
    }
}
