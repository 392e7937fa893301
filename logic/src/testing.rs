//! Fake pins and stores for host tests.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::store::StateStore;

/// Input pin backed by a shared `Cell`, so tests flip the level externally.
pub struct FakeInput<'a>(pub &'a Cell<bool>);

impl ErrorType for FakeInput<'_> {
    type Error = Infallible;
}

impl InputPin for FakeInput<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.get())
    }
}

/// Output pin recording the last driven level (`None` until first write).
pub struct FakeOutput<'a>(pub &'a Cell<Option<bool>>);

impl ErrorType for FakeOutput<'_> {
    type Error = Infallible;
}

impl OutputPin for FakeOutput<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set(Some(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set(Some(true));
        Ok(())
    }
}

pub const FAKE_STORE_SIZE: usize = 32;

/// Byte store over shared memory, so tests inspect persisted state while the
/// coordinator owns the handle.
pub struct FakeStore<'a>(pub &'a RefCell<[u8; FAKE_STORE_SIZE]>);

impl StateStore for FakeStore<'_> {
    type Error = Infallible;

    fn read(&mut self, index: usize) -> Result<u8, Self::Error> {
        Ok(self.0.borrow()[index])
    }

    fn write(&mut self, index: usize, value: u8) -> Result<(), Self::Error> {
        self.0.borrow_mut()[index] = value;
        Ok(())
    }
}

/// Store whose reads and writes always fail, for the degradation paths.
pub struct BrokenStore;

impl StateStore for BrokenStore {
    type Error = ();

    fn read(&mut self, _index: usize) -> Result<u8, Self::Error> {
        Err(())
    }

    fn write(&mut self, _index: usize, _value: u8) -> Result<(), Self::Error> {
        Err(())
    }
}
