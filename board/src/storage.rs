//! SD/MMC storage bring-up.
//!
//! Steps: acquire the transport for a slot, bind it to the card driver under a minor number,
//! then store the transport and announce the card. Calling again while live only re-announces.
//!
//! Card detection is not wired on this board, so bring-up always reports media as present.
use crate::{
    debug_ex,
    error::{BringUpError, BringUpResult, DriverError, Errno, Stage},
    handle::Handle,
    registry::{HandleSlot, SubsystemKind},
    sequence::{BestEffort, StepList, Teardown, best_effort},
};
use core::fmt::Debug;
use log::info;
use utils::define_id;

define_id!(
    /// SD/MMC slot number on the board.
    SlotId,
    usize,
    "slot "
);

define_id!(
    /// Minor number the card driver registers its block device under.
    MinorNumber,
    usize,
    "minor "
);

/// A configured SD/MMC transport.
pub trait Transport: Send + Sync + Debug {
    /// Tell the driver bound to this transport that a card was inserted or removed.
    fn media_change(&self, present: bool) -> Result<(), DriverError>;
}

/// Entry points of the transport and card drivers.
pub trait StorageStack: Sync {
    fn acquire_transport(&self, slot: SlotId) -> Result<Handle<dyn Transport>, DriverError>;

    /// Bind `transport` to the card driver. On failure the driver layer owns any cleanup.
    fn bind_media(
        &self,
        transport: Handle<dyn Transport>,
        minor: MinorNumber,
    ) -> Result<(), DriverError>;
}

pub static STORAGE_STEPS: StepList = StepList {
    kind: SubsystemKind::Storage,
    steps: &[Stage::TransportAcquire, Stage::MediaBind],
    reentry: None,
};

pub struct StorageSequencer<'a> {
    stack: &'a dyn StorageStack,
    slot: &'a HandleSlot<dyn Transport>,
}

impl<'a> StorageSequencer<'a> {
    pub fn new(stack: &'a dyn StorageStack, slot: &'a HandleSlot<dyn Transport>) -> Self {
        StorageSequencer { stack, slot }
    }

    pub fn bring_up(&self, slot_id: SlotId, minor: MinorNumber) -> BringUpResult {
        if let Some(transport) = self.slot.get() {
            debug_ex!("Storage already live, announcing media again.");
            self.announce_media(&transport, true);
            return Ok(());
        }

        info!("Initializing SD/MMC {}...", slot_id);
        let mut runner = STORAGE_STEPS.runner();
        let transport = runner.run(Stage::TransportAcquire, || {
            self.stack.acquire_transport(slot_id)
        })?;
        runner.run(Stage::MediaBind, || {
            self.stack.bind_media(transport.clone(), minor)
        })?;
        self.slot
            .set(transport.clone())
            .map_err(|_| BringUpError::new(Stage::MediaBind, Errno::EBUSY.into()))?;
        info!("SD/MMC {} bound to {}.", slot_id, minor);

        self.announce_media(&transport, true);
        Ok(())
    }

    /// Signal media presence to the bound driver. Never affects the bring-up result.
    pub fn announce_media(&self, transport: &Handle<dyn Transport>, present: bool) -> BestEffort {
        best_effort(SubsystemKind::Storage, Stage::MediaNotify, || {
            transport.media_change(present)
        })
    }

    /// Announce removal and forget the transport. Never fails.
    pub fn tear_down(&self) -> Teardown {
        let Some(transport) = self.slot.get() else {
            return Teardown::NotLive;
        };
        let res = match self.announce_media(&transport, false) {
            BestEffort::Done => Teardown::Clean,
            BestEffort::Ignored(err) => Teardown::Unclean(err),
        };
        self.slot.clear();
        info!("Storage released.");
        res
    }
}
