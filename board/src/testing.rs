//! Fake driver stacks for tests.
//!
//! Every fake shares one [Recorder] that logs calls in order and holds the programmed faults.
//! A call is always recorded, then fails if a fault is set for its [Op].
use crate::{
    error::DriverError,
    flash::{FlashGeometry, FlashStack, Mtd, SpiBus, SpiPort},
    handle::Handle,
    irq::{IrqController, IrqHandler, IrqNumber},
    storage::{MinorNumber, SlotId, StorageStack, Transport},
    usbhost::{ClassDriver, ControllerId, HostController, UsbHal, UsbHostStack},
};
use alloc::{collections::btree_map::BTreeMap, sync::Arc, vec::Vec};
use spin::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    AcquireTransport,
    BindMedia,
    MediaChange,
    AttachIrq,
    RegisterHal,
    RegisterClass,
    AcquireController,
    Start,
    Stop,
    Dump,
    AcquireSpi,
    BindFlash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AcquireTransport(SlotId),
    BindMedia(SlotId, MinorNumber),
    MediaChange(SlotId, bool),
    AttachIrq(IrqNumber),
    RegisterHal,
    RegisterClass(ClassDriver),
    AcquireController(ControllerId),
    Start(ControllerId),
    Stop(ControllerId),
    Dump(ControllerId),
    AcquireSpi(SpiPort),
    BindFlash(SpiPort),
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Call::AcquireTransport(_) => Op::AcquireTransport,
            Call::BindMedia(..) => Op::BindMedia,
            Call::MediaChange(..) => Op::MediaChange,
            Call::AttachIrq(_) => Op::AttachIrq,
            Call::RegisterHal => Op::RegisterHal,
            Call::RegisterClass(_) => Op::RegisterClass,
            Call::AcquireController(_) => Op::AcquireController,
            Call::Start(_) => Op::Start,
            Call::Stop(_) => Op::Stop,
            Call::Dump(_) => Op::Dump,
            Call::AcquireSpi(_) => Op::AcquireSpi,
            Call::BindFlash(_) => Op::BindFlash,
        }
    }
}

#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<Call>>,
    faults: Mutex<Vec<(Op, DriverError)>>,
}

impl Recorder {
    /// Make every later call of `op` fail with `err`.
    pub fn fail(&self, op: Op, err: DriverError) {
        self.heal(op);
        self.faults.lock().push((op, err));
    }

    pub fn heal(&self, op: Op) {
        self.faults.lock().retain(|(o, _)| *o != op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls.lock().iter().filter(|call| call.op() == op).count()
    }

    fn call(&self, call: Call) -> Result<(), DriverError> {
        let op = call.op();
        self.calls.lock().push(call);
        match self.faults.lock().iter().find(|(o, _)| *o == op) {
            Some((_, err)) => Err(*err),
            None => Ok(()),
        }
    }
}

impl core::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Recorder").finish()
    }
}

#[derive(Debug)]
pub struct FakeTransport {
    rec: Arc<Recorder>,
    slot: SlotId,
}

impl Transport for FakeTransport {
    fn media_change(&self, present: bool) -> Result<(), DriverError> {
        self.rec.call(Call::MediaChange(self.slot, present))
    }
}

pub fn transport(rec: &Arc<Recorder>, slot: usize) -> Handle<dyn Transport> {
    let transport: Arc<dyn Transport> = Arc::new(FakeTransport {
        rec: rec.clone(),
        slot: SlotId::from(slot),
    });
    Handle::from(transport)
}

pub struct FakeStorage {
    rec: Arc<Recorder>,
    /// Transports handed out so far, with the slot each one serves.
    slots: Mutex<Vec<(Handle<dyn Transport>, SlotId)>>,
}

impl FakeStorage {
    pub fn new(rec: &Arc<Recorder>) -> FakeStorage {
        FakeStorage {
            rec: rec.clone(),
            slots: Mutex::new(Vec::new()),
        }
    }

    fn slot_of(&self, transport: &Handle<dyn Transport>) -> SlotId {
        self.slots
            .lock()
            .iter()
            .find(|(t, _)| t.same(transport))
            .map(|(_, slot)| *slot)
            .expect("transport not handed out by this stack")
    }
}

impl StorageStack for FakeStorage {
    fn acquire_transport(&self, slot: SlotId) -> Result<Handle<dyn Transport>, DriverError> {
        self.rec.call(Call::AcquireTransport(slot))?;
        let res = transport(&self.rec, *slot);
        self.slots.lock().push((res.clone(), slot));
        Ok(res)
    }

    fn bind_media(
        &self,
        transport: Handle<dyn Transport>,
        minor: MinorNumber,
    ) -> Result<(), DriverError> {
        self.rec.call(Call::BindMedia(self.slot_of(&transport), minor))
    }
}

#[derive(Debug)]
pub struct FakeController {
    rec: Arc<Recorder>,
    id: ControllerId,
}

impl HostController for FakeController {
    fn id(&self) -> ControllerId {
        self.id
    }

    fn start(&self) -> Result<(), DriverError> {
        self.rec.call(Call::Start(self.id))
    }

    fn stop(&self) -> Result<(), DriverError> {
        self.rec.call(Call::Stop(self.id))
    }

    fn dump_registers(&self) {
        let _ = self.rec.call(Call::Dump(self.id));
    }
}

fn usb_interrupt(_irq: IrqNumber) {}

fn noop() {}

fn get_reg32(_offset: usize) -> u32 {
    0
}

fn put_reg32(_offset: usize, _value: u32) {}

pub const TEST_HAL: UsbHal = UsbHal {
    reg_access: noop,
    mem_access: noop,
    get_reg32,
    put_reg32,
};

pub struct FakeUsbHost {
    rec: Arc<Recorder>,
}

impl FakeUsbHost {
    pub fn new(rec: &Arc<Recorder>) -> FakeUsbHost {
        FakeUsbHost { rec: rec.clone() }
    }
}

impl UsbHostStack for FakeUsbHost {
    fn register_hal(&self, _hal: &UsbHal) -> Result<(), DriverError> {
        self.rec.call(Call::RegisterHal)
    }

    fn register_class_driver(&self, class: ClassDriver) -> Result<(), DriverError> {
        self.rec.call(Call::RegisterClass(class))
    }

    fn acquire_controller(
        &self,
        id: ControllerId,
    ) -> Result<Handle<dyn HostController>, DriverError> {
        self.rec.call(Call::AcquireController(id))?;
        let controller: Arc<dyn HostController> = Arc::new(FakeController {
            rec: self.rec.clone(),
            id,
        });
        Ok(Handle::from(controller))
    }

    fn interrupt_handler(&self) -> IrqHandler {
        usb_interrupt
    }
}

pub struct FakeIntc {
    rec: Arc<Recorder>,
    handlers: Mutex<BTreeMap<IrqNumber, IrqHandler>>,
}

impl FakeIntc {
    pub fn new(rec: &Arc<Recorder>) -> FakeIntc {
        FakeIntc {
            rec: rec.clone(),
            handlers: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn is_attached(&self, irq: IrqNumber) -> bool {
        self.handlers.lock().contains_key(&irq)
    }
}

impl IrqController for FakeIntc {
    fn attach(
        &self,
        irq: IrqNumber,
        handler: IrqHandler,
    ) -> Result<Option<IrqHandler>, DriverError> {
        self.rec.call(Call::AttachIrq(irq))?;
        Ok(self.handlers.lock().insert(irq, handler))
    }
}

#[derive(Debug)]
pub struct FakeSpi {
    port: SpiPort,
}

impl SpiBus for FakeSpi {
    fn port(&self) -> SpiPort {
        self.port
    }
}

#[derive(Debug)]
pub struct FakeMtd;

impl Mtd for FakeMtd {
    fn geometry(&self) -> FlashGeometry {
        FlashGeometry {
            block_size: 256,
            erase_size: 64 * 1024,
            erase_blocks: 128,
        }
    }
}

pub struct FakeFlash {
    rec: Arc<Recorder>,
}

impl FakeFlash {
    pub fn new(rec: &Arc<Recorder>) -> FakeFlash {
        FakeFlash { rec: rec.clone() }
    }
}

impl FlashStack for FakeFlash {
    fn acquire_spi(&self, port: SpiPort) -> Result<Handle<dyn SpiBus>, DriverError> {
        self.rec.call(Call::AcquireSpi(port))?;
        let spi: Arc<dyn SpiBus> = Arc::new(FakeSpi { port });
        Ok(Handle::from(spi))
    }

    fn bind_flash(&self, spi: Handle<dyn SpiBus>) -> Result<Handle<dyn Mtd>, DriverError> {
        self.rec.call(Call::BindFlash(spi.port()))?;
        let mtd: Arc<dyn Mtd> = Arc::new(FakeMtd);
        Ok(Handle::from(mtd))
    }
}
