//! USB host bring-up.
//!
//! Steps, in order:
//! 1. Attach the host interrupt handler, when the board wires the controller to an interrupt line.
//! 2. Register the hardware-access adapter ([UsbHal]) with the USB host stack.
//! 3. Register the configured class drivers one by one, stopping at the first failure.
//! 4. Acquire the controller; its handle is stored as soon as this succeeds.
//! 5. Start the controller.
//!
//! Steps 1 to 3 are global registrations with the host stack. Each is done once and recorded in
//! [UsbRegistrations], so a retry after a later failure picks up where registration stopped.
//!
//! Once a controller handle is stored, later calls go straight to step 5, so a failed start can
//! be retried without acquiring the controller again. Teardown stops the controller and retires
//! its handle: the host reads as absent, but acquisition is not undone and the next bring-up
//! only restarts it.
use crate::{
    debug_ex,
    error::{BringUpError, BringUpResult, DriverError, Errno, Stage},
    handle::Handle,
    irq::{IrqController, IrqHandler, IrqNumber},
    registry::{HandleSlot, SubsystemKind},
    sequence::{StepList, StepRunner, Teardown},
};
use core::{
    fmt::{Debug, Display, Formatter},
    sync::atomic::{AtomicUsize, Ordering},
};
use log::{error, info, warn};
use spin::Once;
use utils::define_id;

define_id!(
    /// USB host controller number.
    ControllerId,
    usize,
    "controller "
);

/// Register and memory accessors the USB host stack uses to reach the controller.
///
/// Registered once, globally, before any controller is acquired.
#[derive(Debug, Clone, Copy)]
pub struct UsbHal {
    /// Switch the bus to controller-register access.
    pub reg_access: fn(),
    /// Switch the bus to controller-memory access.
    pub mem_access: fn(),
    pub get_reg32: fn(offset: usize) -> u32,
    pub put_reg32: fn(offset: usize, value: u32),
}

/// Host-side class driver categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassDriver {
    Hub,
    MassStorage,
}

impl Display for ClassDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ClassDriver::Hub => "hub",
            ClassDriver::MassStorage => "mass storage",
        })
    }
}

/// A USB host controller instance.
pub trait HostController: Send + Sync + Debug {
    fn id(&self) -> ControllerId;
    fn start(&self) -> Result<(), DriverError>;
    fn stop(&self) -> Result<(), DriverError>;
    /// Print the controller registers through the driver's own console output.
    fn dump_registers(&self);
}

/// Entry points of the USB host stack.
pub trait UsbHostStack: Sync {
    fn register_hal(&self, hal: &UsbHal) -> Result<(), DriverError>;
    fn register_class_driver(&self, class: ClassDriver) -> Result<(), DriverError>;
    fn acquire_controller(
        &self,
        id: ControllerId,
    ) -> Result<Handle<dyn HostController>, DriverError>;
    /// Interrupt service routine of the host stack.
    fn interrupt_handler(&self) -> IrqHandler;
}

pub static USB_HOST_STEPS: StepList = StepList {
    kind: SubsystemKind::UsbHost,
    steps: &[
        Stage::IrqAttach,
        Stage::HalRegister,
        Stage::ClassDriverRegister,
        Stage::ControllerAcquire,
        Stage::ControllerStart,
    ],
    reentry: Some(Stage::ControllerStart),
};

/// Board-specific inputs of the USB host sequence.
pub struct UsbHostSetup<'a> {
    pub hal: UsbHal,
    /// Class drivers to register, in registration order.
    pub classes: &'a [ClassDriver],
    /// Interrupt line of the controller, if it has its own.
    pub irq: Option<IrqNumber>,
}

/// Global registrations already made with the USB host stack. None of them is ever undone.
pub struct UsbRegistrations {
    irq: Once,
    hal: Once,
    /// Leading configured class drivers registered so far.
    classes: AtomicUsize,
}

impl UsbRegistrations {
    pub const fn new() -> UsbRegistrations {
        UsbRegistrations {
            irq: Once::new(),
            hal: Once::new(),
            classes: AtomicUsize::new(0),
        }
    }
}

impl Default for UsbRegistrations {
    fn default() -> Self {
        Self::new()
    }
}

pub struct UsbHostSequencer<'a> {
    stack: &'a dyn UsbHostStack,
    intc: &'a dyn IrqController,
    setup: UsbHostSetup<'a>,
    done: &'a UsbRegistrations,
    slot: &'a HandleSlot<dyn HostController>,
}

impl<'a> UsbHostSequencer<'a> {
    pub fn new(
        stack: &'a dyn UsbHostStack,
        intc: &'a dyn IrqController,
        setup: UsbHostSetup<'a>,
        done: &'a UsbRegistrations,
        slot: &'a HandleSlot<dyn HostController>,
    ) -> Self {
        UsbHostSequencer {
            stack,
            intc,
            setup,
            done,
            slot,
        }
    }

    pub fn bring_up(&self, id: ControllerId) -> BringUpResult {
        let (controller, mut runner) = match self.slot.retained() {
            Some(controller) => {
                if controller.id() != id {
                    warn!(
                        "USB host {} requested, but {} is already acquired; restarting it.",
                        id,
                        controller.id()
                    );
                }
                (controller, USB_HOST_STEPS.resume())
            }
            None => {
                let mut runner = USB_HOST_STEPS.runner();
                let controller = self.acquire(&mut runner, id)?;
                (controller, runner)
            }
        };

        info!("Running USB host {}...", controller.id());
        runner.run(Stage::ControllerStart, || controller.start())?;
        debug_assert!(runner.is_done());
        self.slot.revive();
        info!("USB host {} running.", controller.id());
        Ok(())
    }

    fn acquire(
        &self,
        runner: &mut StepRunner,
        id: ControllerId,
    ) -> Result<Handle<dyn HostController>, BringUpError> {
        match self.setup.irq {
            Some(irq) if !self.done.irq.is_completed() => {
                runner.run(Stage::IrqAttach, || {
                    let old = self.intc.attach(irq, self.stack.interrupt_handler())?;
                    if old.is_some() {
                        warn!("USB host handler replaced an existing handler on {}.", irq);
                    }
                    Ok(())
                })?;
                self.done.irq.call_once(|| ());
            }
            _ => runner.skip(Stage::IrqAttach),
        }

        if self.done.hal.is_completed() {
            runner.skip(Stage::HalRegister);
        } else {
            runner.run(Stage::HalRegister, || self.stack.register_hal(&self.setup.hal))?;
            self.done.hal.call_once(|| ());
        }

        let registered = self.done.classes.load(Ordering::Acquire);
        match self.setup.classes.get(registered..) {
            Some(pending) if !pending.is_empty() => {
                runner.run(Stage::ClassDriverRegister, || {
                    for class in pending {
                        debug_ex!("\tRegistering {} class driver.", class);
                        self.stack.register_class_driver(*class).inspect_err(|_| {
                            error!("Failed to register {} class driver.", class);
                        })?;
                        self.done.classes.fetch_add(1, Ordering::AcqRel);
                    }
                    Ok(())
                })?;
            }
            _ => runner.skip(Stage::ClassDriverRegister),
        }

        info!("Initializing USB host {}...", id);
        let controller = runner.run(Stage::ControllerAcquire, || {
            self.stack.acquire_controller(id)
        })?;
        self.slot
            .set(controller.clone())
            .map_err(|_| BringUpError::new(Stage::ControllerAcquire, Errno::EBUSY.into()))?;
        Ok(controller)
    }

    /// Stop the controller if one is live and retire its handle. A stop failure is logged and
    /// reported, never raised; the controller counts as gone either way.
    pub fn tear_down(&self) -> Teardown {
        let Some(controller) = self.slot.retire() else {
            return Teardown::NotLive;
        };
        info!("Stopping USB host {}...", controller.id());
        match controller.stop() {
            Ok(()) => Teardown::Clean,
            Err(cause) => {
                warn!("Failed to stop USB host {}: {}", controller.id(), cause);
                Teardown::Unclean(BringUpError::new(Stage::ControllerStop, cause))
            }
        }
    }

    /// Dump controller registers. Return `false` without doing anything if no controller is live.
    pub fn dump_registers(&self) -> bool {
        match self.slot.get() {
            Some(controller) => {
                controller.dump_registers();
                true
            }
            None => false,
        }
    }
}
