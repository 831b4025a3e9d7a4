//! IODispatch (spec §4.8): routes IOX/IOXT addresses to the device that
//! owns them, or to the default handler for anything unmapped.

pub mod console;
pub mod floppy;
pub mod hdd;
pub mod rtc;

pub use console::Console;
pub use floppy::Floppy;
pub use hdd::Hdd;
pub use rtc::Rtc;

use crate::error::Exception;
use crate::interrupt::InterruptController;

const RTC_BASE: u16 = 0o10;
const RTC_TOP: u16 = 0o13;
const CONSOLE_BASE: u16 = 0o300;
const CONSOLE_TOP: u16 = 0o307;
const HDD_BASE: u16 = 0o1540;
const HDD_TOP: u16 = 0o1547;
const FLOPPY_BASE: u16 = 0o1560;
const FLOPPY_TOP: u16 = 0o1567;

/// IIE bit gating the default handler's simulated timeout (spec §4.8,
/// grounded in `io.c`'s `Default_IO`: "if IIE bit 7 is set, simulate a
/// 10us timeout and raise internal interrupt level 14").
const DEFAULT_HANDLER_TIMEOUT_BIT: u16 = 1 << 7;

#[derive(Debug, Default)]
pub struct IoDispatch {
    pub rtc: Rtc,
    pub console: Console,
    pub hdd: Hdd,
    pub floppy: Floppy,
}

impl IoDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&mut self, addr: u16, intr: &mut InterruptController, iie: u16) -> Result<u16, Exception> {
        let _ = intr;
        let value = match addr {
            RTC_BASE..=RTC_TOP => self.rtc.read(addr - RTC_BASE),
            CONSOLE_BASE..=CONSOLE_TOP => self.console.read(addr - CONSOLE_BASE),
            HDD_BASE..=HDD_TOP => self.hdd.read(addr - HDD_BASE),
            FLOPPY_BASE..=FLOPPY_TOP => self.floppy.read(addr - FLOPPY_BASE),
            _ => return default_handler(addr, iie).map(|()| 0),
        };
        Ok(value)
    }

    pub fn write(
        &mut self,
        addr: u16,
        value: u16,
        intr: &mut InterruptController,
        iie: u16,
    ) -> Result<(), Exception> {
        match addr {
            RTC_BASE..=RTC_TOP => self.rtc.write(addr - RTC_BASE, value),
            CONSOLE_BASE..=CONSOLE_TOP => self.console.write(addr - CONSOLE_BASE, value, intr),
            HDD_BASE..=HDD_TOP => self.hdd.write(addr - HDD_BASE, value),
            FLOPPY_BASE..=FLOPPY_TOP => self.floppy.write(addr - FLOPPY_BASE, value),
            _ => return default_handler(addr, iie),
        }
        Ok(())
    }
}

fn default_handler(addr: u16, iie: u16) -> Result<(), Exception> {
    if iie & DEFAULT_HANDLER_TIMEOUT_BIT != 0 {
        Err(Exception::IoxError(addr))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_read_returns_zero_without_iie() {
        let mut io = IoDispatch::new();
        let mut intr = InterruptController::new();
        assert_eq!(io.read(0x7fff, &mut intr, 0).unwrap(), 0);
    }

    #[test]
    fn unmapped_access_times_out_when_iie_bit_seven_set() {
        let mut io = IoDispatch::new();
        let mut intr = InterruptController::new();
        let err = io.read(0x7fff, &mut intr, 1 << 7).unwrap_err();
        assert_eq!(err, Exception::IoxError(0x7fff));
    }

    #[test]
    fn console_addresses_route_to_the_console() {
        let mut io = IoDispatch::new();
        let mut intr = InterruptController::new();
        io.write(0o307, b'z' as u16, &mut intr, 0).unwrap();
        assert_eq!(io.console.host_pop_output(), Some(b'z'));
    }
}
