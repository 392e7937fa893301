//! Byte-indexed persistent storage consumed by the relay coordinator.

/// First store index of the relay state region; one byte per relay follows,
/// `1` = on, `0` = off.
pub const RELAY_STATE_BASE: usize = 0;

/// Non-volatile byte store. Single-byte writes are atomic; there are no
/// transactional guarantees beyond that.
///
/// A failing `read` makes the coordinator fall back to the configured
/// startup state; a failing `write` is logged and the runtime state stays
/// authoritative until the next successful write.
pub trait StateStore {
    type Error;

    fn read(&mut self, index: usize) -> Result<u8, Self::Error>;
    fn write(&mut self, index: usize, value: u8) -> Result<(), Self::Error>;
}
