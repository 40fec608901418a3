//! SPI NOR flash bring-up.
//!
//! Acquire the SPI port, then bind it to the flash driver, which hands back an MTD. The MTD is
//! what the registry keeps; the SPI port belongs to the flash driver from then on.
use crate::{
    debug_ex,
    error::{BringUpError, BringUpResult, DriverError, Errno, Stage},
    handle::Handle,
    registry::{HandleSlot, SubsystemKind},
    sequence::StepList,
};
use core::fmt::Debug;
use log::info;
use utils::define_id;

define_id!(
    /// SPI port number.
    SpiPort,
    usize,
    "spi"
);

/// A configured SPI port.
pub trait SpiBus: Send + Sync + Debug {
    fn port(&self) -> SpiPort;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashGeometry {
    pub block_size: usize,
    pub erase_size: usize,
    pub erase_blocks: usize,
}

/// Memory technology device produced by the flash driver.
pub trait Mtd: Send + Sync + Debug {
    fn geometry(&self) -> FlashGeometry;
}

pub trait FlashStack: Sync {
    fn acquire_spi(&self, port: SpiPort) -> Result<Handle<dyn SpiBus>, DriverError>;
    fn bind_flash(&self, spi: Handle<dyn SpiBus>) -> Result<Handle<dyn Mtd>, DriverError>;
}

pub static SPI_FLASH_STEPS: StepList = StepList {
    kind: SubsystemKind::SpiFlash,
    steps: &[Stage::SpiAcquire, Stage::FlashBind],
    reentry: None,
};

pub struct FlashSequencer<'a> {
    stack: &'a dyn FlashStack,
    slot: &'a HandleSlot<dyn Mtd>,
}

impl<'a> FlashSequencer<'a> {
    pub fn new(stack: &'a dyn FlashStack, slot: &'a HandleSlot<dyn Mtd>) -> Self {
        FlashSequencer { stack, slot }
    }

    pub fn bring_up(&self, port: SpiPort) -> BringUpResult {
        if self.slot.is_live() {
            debug_ex!("SPI flash already bound.");
            return Ok(());
        }
        info!("Initializing {}...", port);
        let mut runner = SPI_FLASH_STEPS.runner();
        let spi = runner.run(Stage::SpiAcquire, || self.stack.acquire_spi(port))?;
        let mtd = runner.run(Stage::FlashBind, || self.stack.bind_flash(spi))?;
        let geometry = mtd.geometry();
        self.slot
            .set(mtd)
            .map_err(|_| BringUpError::new(Stage::FlashBind, Errno::EBUSY.into()))?;
        info!(
            "{} bound to the flash driver: {} erase blocks of {} bytes.",
            port, geometry.erase_blocks, geometry.erase_size
        );
        Ok(())
    }

    pub fn mtd(&self) -> Option<Handle<dyn Mtd>> {
        self.slot.get()
    }
}
