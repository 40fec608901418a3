//! The board orchestrator.
//!
//! [Board] ties a [BoardConfig] to the driver stacks the platform provides and owns the
//! [HandleRegistry]. It exposes one entry point per operation; each builds the matching
//! sequencer over its registry slot and runs it.
//!
//! A subsystem is present only if the configuration lists it *and* the platform supplies its
//! stack. Bring-up of an absent subsystem fails at its first stage with `ENODEV`; teardown and
//! diagnostics of an absent subsystem do nothing.
use crate::{
    config::{BoardConfig, Subsystems},
    error::{BringUpError, BringUpResult, DriverError, Stage},
    flash::{FlashSequencer, FlashStack, SPI_FLASH_STEPS, SpiPort},
    irq::IrqController,
    registry::HandleRegistry,
    sequence::{StepList, Teardown},
    storage::{MinorNumber, STORAGE_STEPS, SlotId, StorageSequencer, StorageStack},
    usbhost::{
        ControllerId, USB_HOST_STEPS, UsbHal, UsbHostSequencer, UsbHostSetup, UsbHostStack,
        UsbRegistrations,
    },
};
use log::{info, warn};
use spin::Once;

pub struct UsbHostPlatform<'a> {
    pub stack: &'a dyn UsbHostStack,
    pub hal: UsbHal,
}

/// Driver stacks supplied by the platform.
pub struct Platform<'a> {
    pub intc: &'a dyn IrqController,
    pub storage: Option<&'a dyn StorageStack>,
    pub usb_host: Option<UsbHostPlatform<'a>>,
    pub flash: Option<&'a dyn FlashStack>,
}

pub struct Board<'a> {
    config: BoardConfig,
    platform: Platform<'a>,
    registry: HandleRegistry,
    usb_registrations: UsbRegistrations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// The board does not have the subsystem.
    Skipped,
    Ready,
    Failed(BringUpError),
}

impl From<BringUpResult> for InitOutcome {
    fn from(value: BringUpResult) -> Self {
        match value {
            Ok(()) => InitOutcome::Ready,
            Err(err) => InitOutcome::Failed(err),
        }
    }
}

/// Per-subsystem outcome of [Board::initialize].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitReport {
    pub spi_flash: InitOutcome,
    pub storage: InitOutcome,
    pub usb_host: InitOutcome,
}

impl InitReport {
    /// Whether every present subsystem came up.
    pub fn all_ready(&self) -> bool {
        [self.spi_flash, self.storage, self.usb_host]
            .iter()
            .all(|outcome| !matches!(outcome, InitOutcome::Failed(_)))
    }
}

/// `ENODEV` tagged with the first stage of `steps`.
fn not_present(steps: &StepList) -> BringUpError {
    warn!("No {} on this board.", steps.kind);
    let stage = steps.steps.first().copied().unwrap_or(Stage::TransportAcquire);
    BringUpError::new(stage, DriverError::NO_DEVICE)
}

impl<'a> Board<'a> {
    pub fn new(config: BoardConfig, platform: Platform<'a>) -> Board<'a> {
        Board {
            config,
            platform,
            registry: HandleRegistry::new(),
            usb_registrations: UsbRegistrations::new(),
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    fn storage(&self) -> Option<StorageSequencer<'_>> {
        let stack = self.platform.storage.filter(|_| self.config.has(Subsystems::STORAGE))?;
        Some(StorageSequencer::new(stack, &self.registry.storage))
    }

    fn usb_host(&self) -> Option<UsbHostSequencer<'_>> {
        let usb = self
            .platform
            .usb_host
            .as_ref()
            .filter(|_| self.config.has(Subsystems::USB_HOST))?;
        let setup = UsbHostSetup {
            hal: usb.hal,
            classes: &self.config.usb_classes,
            irq: self.config.usb_host_irq,
        };
        Some(UsbHostSequencer::new(
            usb.stack,
            self.platform.intc,
            setup,
            &self.usb_registrations,
            &self.registry.usb_host,
        ))
    }

    fn flash(&self) -> Option<FlashSequencer<'_>> {
        let stack = self.platform.flash.filter(|_| self.config.has(Subsystems::SPI_FLASH))?;
        Some(FlashSequencer::new(stack, &self.registry.spi_flash))
    }

    /// Bring up SD/MMC storage on `slot`, registering the card under `minor`.
    ///
    /// Safe to call repeatedly: while storage is live this only announces the card again.
    pub fn bring_up_storage(&self, slot: SlotId, minor: MinorNumber) -> BringUpResult {
        match self.storage() {
            Some(seq) => seq.bring_up(slot, minor),
            None => Err(not_present(&STORAGE_STEPS)),
        }
    }

    pub fn tear_down_storage(&self) -> Teardown {
        self.storage().map_or(Teardown::NotLive, |seq| seq.tear_down())
    }

    /// Bring up USB host controller `id`, or restart it if it is already acquired.
    pub fn bring_up_usb_host(&self, id: ControllerId) -> BringUpResult {
        match self.usb_host() {
            Some(seq) => seq.bring_up(id),
            None => Err(not_present(&USB_HOST_STEPS)),
        }
    }

    pub fn tear_down_usb_host(&self) -> Teardown {
        self.usb_host().map_or(Teardown::NotLive, |seq| seq.tear_down())
    }

    /// Dump the registers of the live USB host controller. Return whether anything was dumped.
    pub fn dump_usb_host_registers(&self) -> bool {
        self.usb_host().is_some_and(|seq| seq.dump_registers())
    }

    pub fn bring_up_spi_flash(&self, port: SpiPort) -> BringUpResult {
        match self.flash() {
            Some(seq) => seq.bring_up(port),
            None => Err(not_present(&SPI_FLASH_STEPS)),
        }
    }

    /// Bring up every subsystem the board has, with the configured identifiers.
    ///
    /// A failing subsystem is logged and recorded; the remaining ones are still attempted.
    pub fn initialize(&self) -> InitReport {
        info!("Initializing peripherals of {}...", self.config.name);
        let config = &self.config;
        let report = InitReport {
            spi_flash: self.init_one(Subsystems::SPI_FLASH, || {
                self.bring_up_spi_flash(config.spi_flash_port)
            }),
            storage: self.init_one(Subsystems::STORAGE, || {
                self.bring_up_storage(config.mmcsd_slot, config.mmcsd_minor)
            }),
            usb_host: self.init_one(Subsystems::USB_HOST, || {
                self.bring_up_usb_host(config.usb_host)
            }),
        };
        info!("Peripheral initialization done.");
        report
    }

    fn init_one(
        &self,
        subsystem: Subsystems,
        bring_up: impl FnOnce() -> BringUpResult,
    ) -> InitOutcome {
        if !self.config.has(subsystem) {
            return InitOutcome::Skipped;
        }
        let outcome = InitOutcome::from(bring_up());
        if let InitOutcome::Failed(err) = outcome {
            warn!("Continuing without {:?}: {}", subsystem, err);
        }
        outcome
    }
}

static BOARD: Once<Board<'static>> = Once::new();

/// Install the process-wide board. The first installed board wins; later calls return it.
pub fn install(board: Board<'static>) -> &'static Board<'static> {
    BOARD.call_once(|| board)
}

/// The process-wide board, if one has been installed.
pub fn board() -> Option<&'static Board<'static>> {
    BOARD.get()
}
