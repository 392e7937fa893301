//! Relay state persistence in the last sector of the on-board flash.
//!
//! One byte per relay, `1` = on, `0` = off. The sector is cached in RAM;
//! a write updates the cache and reprograms the first page. Erased flash
//! reads `0xFF`, which the coordinator treats as "off".

use defmt_or_log as log;
use embassy_rp::flash::{Blocking, Error, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use multirelay_logic::{StateStore, MAX_RELAYS};

const FLASH_SIZE: usize = 2 * 1024 * 1024;
/// Matches the reservation carved out of the FLASH region in `memory.x`.
const STORE_OFFSET: usize = FLASH_SIZE - ERASE_SIZE;
const PAGE_SIZE: usize = 256;

const _: () = {
    assert!(
        STORE_OFFSET % ERASE_SIZE == 0,
        "state store must be erase-aligned"
    );
    assert!(
        MAX_RELAYS <= PAGE_SIZE,
        "state bytes must fit a single flash page"
    );
};

pub struct FlashStateStore<'a> {
    flash: Flash<'a, FLASH, Blocking, FLASH_SIZE>,
    page: [u8; PAGE_SIZE],
    /// Error from the initial sector read; reported to the consumer so it
    /// falls back to startup defaults instead of trusting the blank cache.
    load_error: Option<Error>,
}

impl<'a> FlashStateStore<'a> {
    pub fn new(flash_peripheral: Peri<'static, FLASH>) -> Self {
        let mut flash = Flash::new_blocking(flash_peripheral);
        let mut page = [0xFF; PAGE_SIZE];
        let load_error = match flash.blocking_read(STORE_OFFSET as u32, &mut page) {
            Ok(()) => None,
            Err(e) => {
                log::error!("state store unreadable: {}", e);
                Some(e)
            }
        };
        Self {
            flash,
            page,
            load_error,
        }
    }

    fn program(&mut self) -> Result<(), Error> {
        self.flash
            .blocking_erase(STORE_OFFSET as u32, (STORE_OFFSET + ERASE_SIZE) as u32)?;
        self.flash.blocking_write(STORE_OFFSET as u32, &self.page)
    }
}

impl StateStore for FlashStateStore<'_> {
    type Error = Error;

    fn read(&mut self, index: usize) -> Result<u8, Error> {
        if let Some(e) = self.load_error {
            return Err(e);
        }
        self.page.get(index).copied().ok_or(Error::OutOfBounds)
    }

    fn write(&mut self, index: usize, value: u8) -> Result<(), Error> {
        if index >= self.page.len() {
            return Err(Error::OutOfBounds);
        }
        if self.page[index] == value {
            return Ok(());
        }
        self.page[index] = value;
        self.program()
    }
}
