//! Board peripheral bring-up.
//!
//! Sequences the calls that move the optional on-board subsystems (SD/MMC storage, the USB host
//! controller and SPI flash) from absent to live and back. The drivers themselves live behind
//! the stack traits in [storage], [usbhost] and [flash]; this crate only orders the calls,
//! tracks which handles are live in the [registry], and reports which step failed.
//#![deny(missing_docs)]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
pub mod console;
pub mod logging;

pub mod board;
pub mod config;
pub mod error;
pub mod flash;
pub mod handle;
pub mod irq;
pub mod registry;
pub mod sequence;
pub mod storage;
pub mod usbhost;

#[cfg(test)]
mod testing;

pub use board::{Board, InitOutcome, InitReport, Platform, UsbHostPlatform};
pub use error::{BringUpError, BringUpResult, DriverError, Errno, Stage};
