//! Error types shared by the bring-up sequencers.
//!
//! A failed bring-up is reported as a [BringUpError]: the [Stage] that failed plus the
//! [DriverError] the driver returned for it. Drivers speak errno, so [DriverError] keeps the
//! code it was built from and decodes the ones this board cares about into [Errno].

use core::fmt::{Display, Formatter};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// One step of a bring-up or teardown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive)]
#[repr(u8)]
pub enum Stage {
    /// Acquiring the SD/MMC transport for a slot.
    TransportAcquire = 1,
    /// Binding the transport to the block (card) driver.
    MediaBind = 2,
    /// Telling the bound driver that media was inserted or removed. Best effort only.
    MediaNotify = 3,
    /// Attaching the USB host interrupt handler.
    IrqAttach = 4,
    /// Registering the USB host hardware-access adapter.
    HalRegister = 5,
    /// Registering the USB class drivers.
    ClassDriverRegister = 6,
    /// Acquiring the USB host controller instance.
    ControllerAcquire = 7,
    /// Starting the USB host controller.
    ControllerStart = 8,
    /// Stopping the USB host controller.
    ControllerStop = 9,
    /// Acquiring the SPI port the flash sits on.
    SpiAcquire = 10,
    /// Binding the SPI port to the flash driver.
    FlashBind = 11,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::TransportAcquire => "transport acquisition",
            Stage::MediaBind => "media binding",
            Stage::MediaNotify => "media notification",
            Stage::IrqAttach => "interrupt attach",
            Stage::HalRegister => "HAL registration",
            Stage::ClassDriverRegister => "class driver registration",
            Stage::ControllerAcquire => "controller acquisition",
            Stage::ControllerStart => "controller start",
            Stage::ControllerStop => "controller stop",
            Stage::SpiAcquire => "SPI acquisition",
            Stage::FlashBind => "flash binding",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// errno values drivers are known to return.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum Errno {
    EPERM = 1,
    ENOENT = 2,
    EIO = 5,
    ENXIO = 6,
    EAGAIN = 11,
    ENOMEM = 12,
    EBUSY = 16,
    EEXIST = 17,
    ENODEV = 19,
    EINVAL = 22,
    ENOSYS = 38,
    ETIMEDOUT = 110,
}

/// Failure signal returned by a driver entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverError {
    /// A recognised errno.
    Errno(Errno),
    /// Any other non-zero return code, kept as returned.
    Code(i32),
}

impl DriverError {
    /// The driver produced no device (a null handle in C terms).
    pub const NO_DEVICE: DriverError = DriverError::Errno(Errno::ENODEV);

    /// Interpret a driver return code. Both `-EIO` and `EIO` decode to [Errno::EIO].
    pub fn from_code(code: i32) -> DriverError {
        code.checked_abs()
            .and_then(|magnitude| Errno::try_from(magnitude).ok())
            .map(DriverError::Errno)
            .unwrap_or(DriverError::Code(code))
    }

    /// Negative errno-style code for reporting to a command layer.
    pub fn code(&self) -> i32 {
        match self {
            DriverError::Errno(errno) => -i32::from(*errno),
            DriverError::Code(code) if *code > 0 => -*code,
            DriverError::Code(code) => *code,
        }
    }
}

impl From<Errno> for DriverError {
    fn from(value: Errno) -> Self {
        DriverError::Errno(value)
    }
}

impl Display for DriverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            DriverError::Errno(errno) => f.write_fmt(format_args!("{:?}", errno)),
            DriverError::Code(code) => f.write_fmt(format_args!("driver error {}", code)),
        }
    }
}

/// A bring-up or teardown step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BringUpError {
    pub stage: Stage,
    pub cause: DriverError,
}

impl BringUpError {
    pub const fn new(stage: Stage, cause: DriverError) -> BringUpError {
        BringUpError { stage, cause }
    }

    /// Negative errno-style result code, see [DriverError::code].
    pub fn code(&self) -> i32 {
        self.cause.code()
    }
}

impl Display for BringUpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{} failed: {}", self.stage, self.cause))
    }
}

/// `Ok(())` means the subsystem is ready.
pub type BringUpResult = Result<(), BringUpError>;
