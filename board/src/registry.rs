//! Live-handle registry.
//!
//! Holds at most one live handle per [SubsystemKind]. Each kind has its own typed
//! [HandleSlot]; the kind-keyed helpers on [HandleRegistry] are for callers that only care about
//! liveness.
//!
//! A slot is only ever written by the sequencer that owns its kind. The check-then-set done by
//! the sequencers is not atomic across callers, so callers must not run two operations on the
//! same kind at once. The locks only keep each individual get/set/clear sound.
use crate::{debug_ex, flash::Mtd, handle::Handle, storage::Transport, usbhost::HostController};
use core::fmt::{Display, Formatter};
use spin::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubsystemKind {
    Storage,
    UsbHost,
    SpiFlash,
}

impl Display for SubsystemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            SubsystemKind::Storage => "storage",
            SubsystemKind::UsbHost => "usb host",
            SubsystemKind::SpiFlash => "spi flash",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// A handle of this kind is already stored.
    AlreadyLive(SubsystemKind),
}

struct Entry<T: ?Sized> {
    handle: Handle<T>,
    /// Cleared by teardown for subsystems that keep their handle after being stopped.
    live: bool,
}

/// Storage for the single handle of one kind.
///
/// A stored handle is normally live. [HandleSlot::retire] keeps it but marks it dead, so the
/// subsystem reads as absent until [HandleSlot::revive] is called after a restart.
pub struct HandleSlot<T: ?Sized> {
    kind: SubsystemKind,
    inner: RwLock<Option<Entry<T>>>,
}

impl<T: ?Sized> HandleSlot<T> {
    pub const fn new(kind: SubsystemKind) -> HandleSlot<T> {
        HandleSlot {
            kind,
            inner: RwLock::new(None),
        }
    }

    /// The live handle, if any. A retired handle is not returned.
    pub fn get(&self) -> Option<Handle<T>> {
        self.inner
            .read()
            .as_ref()
            .filter(|entry| entry.live)
            .map(|entry| entry.handle.clone())
    }

    /// The stored handle, live or retired.
    pub fn retained(&self) -> Option<Handle<T>> {
        self.inner.read().as_ref().map(|entry| entry.handle.clone())
    }

    pub fn is_live(&self) -> bool {
        self.inner.read().as_ref().is_some_and(|entry| entry.live)
    }

    /// Store `handle` as the live handle. Fails if a handle, live or retired, is already stored;
    /// the stored one is kept.
    pub fn set(&self, handle: Handle<T>) -> Result<(), RegistryError> {
        let mut guard = self.inner.write();
        if guard.is_some() {
            return Err(RegistryError::AlreadyLive(self.kind));
        }
        *guard = Some(Entry { handle, live: true });
        debug_ex!("\t{} handle registered.", self.kind);
        Ok(())
    }

    /// Mark the stored handle dead but keep it. Return it if it was live.
    pub fn retire(&self) -> Option<Handle<T>> {
        let mut guard = self.inner.write();
        let entry = guard.as_mut().filter(|entry| entry.live)?;
        entry.live = false;
        debug_ex!("\t{} handle retired.", self.kind);
        Some(entry.handle.clone())
    }

    /// Mark a retired handle live again. No-op if nothing is stored.
    pub fn revive(&self) {
        if let Some(entry) = self.inner.write().as_mut() {
            entry.live = true;
        }
    }

    /// Drop the stored handle, returning it. No-op if absent.
    pub fn clear(&self) -> Option<Handle<T>> {
        let res = self.inner.write().take().map(|entry| entry.handle);
        if res.is_some() {
            debug_ex!("\t{} handle released.", self.kind);
        }
        res
    }
}

pub struct HandleRegistry {
    pub storage: HandleSlot<dyn Transport>,
    pub usb_host: HandleSlot<dyn HostController>,
    pub spi_flash: HandleSlot<dyn Mtd>,
}

impl HandleRegistry {
    pub const fn new() -> HandleRegistry {
        HandleRegistry {
            storage: HandleSlot::new(SubsystemKind::Storage),
            usb_host: HandleSlot::new(SubsystemKind::UsbHost),
            spi_flash: HandleSlot::new(SubsystemKind::SpiFlash),
        }
    }

    pub fn is_live(&self, kind: SubsystemKind) -> bool {
        match kind {
            SubsystemKind::Storage => self.storage.is_live(),
            SubsystemKind::UsbHost => self.usb_host.is_live(),
            SubsystemKind::SpiFlash => self.spi_flash.is_live(),
        }
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
