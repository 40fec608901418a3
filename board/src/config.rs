//! Board capabilities.
//!
//! [BoardConfig] says which optional subsystems the board has and which slot, controller, port
//! and interrupt line each one uses. It is assembled once at startup, normally from the
//! build-time flags of the `config` crate, and then only read.
use crate::{
    flash::SpiPort,
    irq::{GpioIrqBanks, IrqLayout, IrqNumber},
    storage::{MinorNumber, SlotId},
    usbhost::{ClassDriver, ControllerId},
};
use alloc::vec::Vec;
use bitflags::bitflags;
use config::build_flags as flags;
use log::warn;

bitflags! {
    /// Optional subsystems present on the board.
    pub struct Subsystems: u32 {
        const STORAGE   = 0b001;
        const USB_HOST  = 0b010;
        const SPI_FLASH = 0b100;
    }
}

#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub name: &'static str,
    pub subsystems: Subsystems,
    pub mmcsd_slot: SlotId,
    pub mmcsd_minor: MinorNumber,
    pub usb_host: ControllerId,
    /// Interrupt line of the USB host controller, if wired to one.
    pub usb_host_irq: Option<IrqNumber>,
    /// Class drivers registered during USB host bring-up, in order.
    pub usb_classes: Vec<ClassDriver>,
    pub spi_flash_port: SpiPort,
}

impl BoardConfig {
    /// A board with no optional subsystems.
    pub fn bare(name: &'static str) -> BoardConfig {
        BoardConfig {
            name,
            subsystems: Subsystems::empty(),
            mmcsd_slot: SlotId::from(0),
            mmcsd_minor: MinorNumber::from(0),
            usb_host: ControllerId::from(0),
            usb_host_irq: None,
            usb_classes: Vec::new(),
            spi_flash_port: SpiPort::from(0),
        }
    }

    pub fn has(&self, subsystem: Subsystems) -> bool {
        self.subsystems.contains(subsystem)
    }

    /// Interrupt layout described by the build flags.
    pub fn irq_layout() -> IrqLayout {
        IrqLayout::new(
            flags::IRQ_EXTINT,
            flags::IRQ_NPERIPHERALS,
            GpioIrqBanks::from_bits_truncate(flags::GPIO_IRQ_BANKS as u8),
        )
    }

    /// Build the configuration of the board selected at build time.
    pub fn from_build_flags() -> BoardConfig {
        let mut config = BoardConfig::bare(flags::BOARD_NAME);

        if flags::HAVE_MMCSD != 0 {
            config.subsystems |= Subsystems::STORAGE;
            config.mmcsd_slot = SlotId::from(flags::MMCSD_SLOTNO);
            config.mmcsd_minor = MinorNumber::from(flags::MMCSD_MINOR);
        }

        if flags::HAVE_USBHOST != 0 {
            config.subsystems |= Subsystems::USB_HOST;
            config.usb_host = ControllerId::from(flags::USBHOST_NO);
            if flags::HAVE_USBHOST_STORAGE != 0 {
                config.usb_classes.push(ClassDriver::MassStorage);
            }
            if flags::HAVE_USBHOST_HUB != 0 {
                config.usb_classes.push(ClassDriver::Hub);
            }
            config.usb_host_irq = usb_host_irq(&Self::irq_layout());
        }

        if flags::HAVE_SPI_FLASH != 0 {
            config.subsystems |= Subsystems::SPI_FLASH;
            config.spi_flash_port = SpiPort::from(flags::SPI_FLASH_PORT);
        }
        config
    }
}

fn usb_host_irq(layout: &IrqLayout) -> Option<IrqNumber> {
    let bank = GpioIrqBanks::from_bits_truncate(flags::USBHOST_IRQ_BANK as u8);
    if bank.is_empty() {
        return None;
    }
    let irq = layout.gpio_pin(bank, flags::USBHOST_IRQ_PIN);
    if irq.is_none() {
        warn!(
            "USB host interrupt pin {} of GPIO bank {:?} has no interrupt line; running without it.",
            flags::USBHOST_IRQ_PIN,
            bank
        );
    }
    irq
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_flags_agree_with_config() {
        let config = BoardConfig::from_build_flags();
        assert_eq!(config.name, flags::BOARD_NAME);
        assert_eq!(config.has(Subsystems::STORAGE), flags::HAVE_MMCSD != 0);
        assert_eq!(config.has(Subsystems::USB_HOST), flags::HAVE_USBHOST != 0);
        assert_eq!(config.has(Subsystems::SPI_FLASH), flags::HAVE_SPI_FLASH != 0);
        if !config.has(Subsystems::USB_HOST) {
            assert!(config.usb_classes.is_empty());
            assert_eq!(config.usb_host_irq, None);
        }
        if let Some(irq) = config.usb_host_irq {
            assert!(*irq < BoardConfig::irq_layout().count());
        }
    }

    #[test]
    fn default_board_has_flash_on_spi1() {
        let config = BoardConfig::from_build_flags();
        if config.name == "stm3210e-eval" {
            assert!(config.has(Subsystems::SPI_FLASH));
            assert_eq!(config.spi_flash_port, SpiPort::from(1));
            assert!(config.has(Subsystems::STORAGE | Subsystems::USB_HOST));
        }
    }

    #[test]
    fn bare_board_has_nothing() {
        let config = BoardConfig::bare("test");
        assert!(!config.has(Subsystems::STORAGE));
        assert!(!config.has(Subsystems::USB_HOST));
        assert!(!config.has(Subsystems::SPI_FLASH));
        assert!(config.has(Subsystems::empty()));
    }
}
