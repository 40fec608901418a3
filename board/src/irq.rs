//! Interrupt numbers and handler registration.
//!
//! The IRQ space is flat: the core exceptions come first, then one line per peripheral
//! identifier, then optionally 32 lines per GPIO bank that has pin interrupts enabled. Only the
//! enabled banks take up numbers, in bank order, so a pin's number depends on which banks come
//! before it. [IrqLayout] holds that composition for a board; the sequencers never compute
//! numbers themselves, they receive an [IrqNumber] from the board configuration.
use crate::error::DriverError;
use bitflags::bitflags;
use utils::define_id;

define_id!(
    /// Global interrupt number a handler can be attached to.
    IrqNumber,
    usize,
    "irq "
);

pub type IrqHandler = fn(IrqNumber);

/// Interrupt-controller entry point used during bring-up.
pub trait IrqController: Sync {
    /// Attach `handler` to `irq`, returning the handler it replaces.
    fn attach(
        &self,
        irq: IrqNumber,
        handler: IrqHandler,
    ) -> Result<Option<IrqHandler>, DriverError>;
}

bitflags! {
    /// GPIO banks with per-pin interrupt lines.
    pub struct GpioIrqBanks: u8 {
        const A = 0b001;
        const B = 0b010;
        const C = 0b100;
    }
}

pub const PINS_PER_BANK: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqLayout {
    /// First number after the core exceptions.
    ext_base: usize,
    /// Number of peripheral identifiers.
    peripherals: usize,
    banks: GpioIrqBanks,
}

impl IrqLayout {
    pub const fn new(ext_base: usize, peripherals: usize, banks: GpioIrqBanks) -> IrqLayout {
        IrqLayout {
            ext_base,
            peripherals,
            banks,
        }
    }

    /// Interrupt line of peripheral `pid`.
    pub fn peripheral(&self, pid: usize) -> Option<IrqNumber> {
        (pid < self.peripherals).then(|| IrqNumber::from(self.ext_base + pid))
    }

    /// Interrupt line of `pin` in `bank`. `bank` must name exactly one enabled bank.
    pub fn gpio_pin(&self, bank: GpioIrqBanks, pin: usize) -> Option<IrqNumber> {
        if bank.bits().count_ones() != 1 || !self.banks.contains(bank) || pin >= PINS_PER_BANK {
            return None;
        }
        let banks_before = (self.banks.bits() & (bank.bits() - 1)).count_ones() as usize;
        Some(IrqNumber::from(
            self.ext_base + self.peripherals + banks_before * PINS_PER_BANK + pin,
        ))
    }

    /// Total count of interrupt numbers.
    pub fn count(&self) -> usize {
        self.ext_base + self.peripherals + self.banks.bits().count_ones() as usize * PINS_PER_BANK
    }
}
