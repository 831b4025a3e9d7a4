//! Real-time clock, registers 0010-0013 octal (spec §4.8), grounded in
//! `examples/original_source/rtc.h`'s `rtc_data { irq_en, rdy, cntr_20ms }`.

use crate::interrupt::{IdentEntry, InterruptController};
use crate::primitives::RTC_LEVEL;

const TICKS_PER_PANEL_COUNT: u8 = 50;

#[derive(Debug, Default)]
pub struct Rtc {
    irq_en: bool,
    rdy: bool,
    cntr_20ms: u8,
    panel_count: u16,
}

impl Rtc {
    pub fn new() -> Self {
        Self::default()
    }

    /// One 20ms tick; wraps `cntr_20ms` at 50 and bumps the panel-processor
    /// counter, posting level-13 if the guest has enabled the clock.
    pub fn tick(&mut self, intr: &mut InterruptController) {
        self.rdy = true;
        self.cntr_20ms = (self.cntr_20ms + 1) % TICKS_PER_PANEL_COUNT;
        if self.cntr_20ms == 0 {
            self.panel_count = self.panel_count.wrapping_add(1);
        }
        if self.irq_en {
            intr.enqueue_ident(IdentEntry {
                level: RTC_LEVEL,
                identcode: 0o07,
                caller_id: 501,
            });
        }
    }

    pub fn read(&mut self, reg: u16) -> u16 {
        match reg {
            0 => {
                let v = self.rdy as u16;
                self.rdy = false;
                v
            }
            2 => self.panel_count,
            _ => 0,
        }
    }

    pub fn write(&mut self, reg: u16, value: u16) {
        if reg == 1 {
            self.irq_en = value & 1 != 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifty_ticks_bump_the_panel_counter_once() {
        let mut rtc = Rtc::new();
        let mut intr = InterruptController::new();
        for _ in 0..50 {
            rtc.tick(&mut intr);
        }
        assert_eq!(rtc.read(2), 1);
    }

    #[test]
    fn enabled_irq_posts_level_thirteen() {
        let mut rtc = Rtc::new();
        let mut intr = InterruptController::new();
        rtc.write(1, 1);
        rtc.tick(&mut intr);
        assert!(intr.pop_ident(RTC_LEVEL).is_some());
    }
}
