//! Time-based debouncing of a binary input pin.

use embedded_hal::digital::InputPin;

use crate::clock::{self, Millis};

/// Default settle time before a raw level change is accepted.
pub const DEBOUNCE_MS: u32 = 50;

/// Debounced view of an input pin.
///
/// Between two successive `true` returns of [`update`](Self::update), the
/// value reported by [`read`](Self::read) is stable.
pub struct DebouncedInput<P> {
    pin: P,
    stable: bool,
    raw: bool,
    raw_since: Millis,
    settle_ms: u32,
}

impl<P: InputPin> DebouncedInput<P> {
    pub fn new(pin: P) -> Self {
        Self::with_settle_time(pin, DEBOUNCE_MS)
    }

    pub fn with_settle_time(mut pin: P, settle_ms: u32) -> Self {
        let level = pin.is_high().unwrap_or(false);
        Self {
            pin,
            stable: level,
            raw: level,
            raw_since: 0,
            settle_ms,
        }
    }

    /// Ingest a fresh sample. Returns `true` iff the debounced level changed.
    pub fn update(&mut self, now: Millis) -> bool {
        // A read fault keeps the previous raw sample; the pin then simply
        // looks unchanged for this tick.
        let sample = self.pin.is_high().unwrap_or(self.raw);

        if sample != self.raw {
            self.raw = sample;
            self.raw_since = now;
            return false;
        }

        if sample != self.stable && clock::elapsed(now, self.raw_since) >= self.settle_ms {
            self.stable = sample;
            return true;
        }

        false
    }

    /// Last debounced level.
    pub fn read(&self) -> bool {
        self.stable
    }
}
