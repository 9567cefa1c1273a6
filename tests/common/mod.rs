#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ble_session::host::{
    ChangeStream, Host, HostDevice, RemoteCharacteristic, RemoteDescriptor, RemoteGatt,
    RemoteService,
};
use ble_session::{Bluetooth, CharPropFlags, DeviceRequest, WriteType};
use btleplug::{Error, Result};
use futures::StreamExt;
use tokio::sync::{broadcast, Notify};
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

pub use btleplug::api::bleuuid::uuid_from_u16;

pub struct MockHost {
    pub available: bool,
    pub gatt: Arc<MockGatt>,
    pub requests: Mutex<Vec<DeviceRequest>>,
    pub request_error: Mutex<Option<Error>>,
    pub availability_calls: AtomicUsize,
    /// When set, every availability check fails with this message.
    pub availability_error: Mutex<Option<String>>,
}

impl MockHost {
    pub fn new(gatt: Arc<MockGatt>) -> Self {
        Self {
            available: true,
            gatt,
            requests: Mutex::new(Vec::new()),
            request_error: Mutex::new(None),
            availability_calls: AtomicUsize::new(0),
            availability_error: Mutex::new(None),
        }
    }

    pub fn unavailable(gatt: Arc<MockGatt>) -> Self {
        Self {
            available: false,
            ..Self::new(gatt)
        }
    }

    /// The chooser fails with `error`, as when the user dismisses the picker.
    pub fn rejecting(gatt: Arc<MockGatt>, error: Error) -> Self {
        let host = Self::new(gatt);
        *host.request_error.lock().unwrap() = Some(error);
        host
    }

    /// The adapter state cannot be queried, as when the radio service is down.
    pub fn broken(gatt: Arc<MockGatt>, message: &str) -> Self {
        let host = Self::new(gatt);
        *host.availability_error.lock().unwrap() = Some(message.to_string());
        host
    }

    pub fn availability_calls(&self) -> usize {
        self.availability_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<DeviceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Host for MockHost {
    async fn availability(&self) -> Result<bool> {
        self.availability_calls.fetch_add(1, Ordering::SeqCst);

        match self.availability_error.lock().unwrap().as_ref() {
            Some(message) => Err(Error::RuntimeError(message.clone())),
            None => Ok(self.available),
        }
    }

    async fn request_device(&self, request: &DeviceRequest) -> Result<HostDevice> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(e) = self.request_error.lock().unwrap().take() {
            return Err(e);
        }

        Ok(HostDevice {
            id: "mock-device".to_string(),
            name: Some("Mock".to_string()),
            gatt: self.gatt.clone(),
        })
    }
}

pub struct MockGatt {
    pub services: Vec<Arc<MockService>>,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub connect_fails: bool,
}

impl MockGatt {
    pub fn new(services: Vec<Arc<MockService>>) -> Arc<Self> {
        Arc::new(Self {
            services,
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            connect_fails: false,
        })
    }

    pub fn unreachable(services: Vec<Arc<MockService>>) -> Arc<Self> {
        Arc::new(Self {
            services,
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            connect_fails: true,
        })
    }
}

#[async_trait]
impl RemoteGatt for MockGatt {
    async fn connect(&self) -> Result<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        if self.connect_fails {
            Err(Error::NotConnected)
        } else {
            Ok(())
        }
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn primary_services(&self, uuid: Option<Uuid>) -> Result<Vec<Arc<dyn RemoteService>>> {
        Ok(self
            .services
            .iter()
            .filter(|service| uuid.map_or(true, |uuid| service.uuid == uuid))
            .map(|service| service.clone() as Arc<dyn RemoteService>)
            .collect())
    }
}

pub struct MockService {
    pub uuid: Uuid,
    pub primary: bool,
    pub characteristics: Vec<Arc<MockCharacteristic>>,
    /// Delay before the characteristics are returned.
    pub delay: Option<Duration>,
    pub fails: bool,
}

impl MockService {
    pub fn new(uuid: Uuid, characteristics: Vec<Arc<MockCharacteristic>>) -> Arc<Self> {
        Arc::new(Self::plain(uuid, characteristics))
    }

    pub fn secondary(uuid: Uuid, characteristics: Vec<Arc<MockCharacteristic>>) -> Arc<Self> {
        Arc::new(Self {
            primary: false,
            ..Self::plain(uuid, characteristics)
        })
    }

    pub fn delayed(
        uuid: Uuid,
        characteristics: Vec<Arc<MockCharacteristic>>,
        delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::plain(uuid, characteristics)
        })
    }

    pub fn failing(uuid: Uuid) -> Arc<Self> {
        Arc::new(Self {
            fails: true,
            ..Self::plain(uuid, Vec::new())
        })
    }

    fn plain(uuid: Uuid, characteristics: Vec<Arc<MockCharacteristic>>) -> Self {
        Self {
            uuid,
            primary: true,
            characteristics,
            delay: None,
            fails: false,
        }
    }
}

#[async_trait]
impl RemoteService for MockService {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn is_primary(&self) -> bool {
        self.primary
    }

    async fn characteristics(
        &self,
        uuid: Option<Uuid>,
    ) -> Result<Vec<Arc<dyn RemoteCharacteristic>>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fails {
            return Err(Error::RuntimeError("service went away".to_string()));
        }

        Ok(self
            .characteristics
            .iter()
            .filter(|characteristic| uuid.map_or(true, |uuid| characteristic.uuid == uuid))
            .map(|characteristic| characteristic.clone() as Arc<dyn RemoteCharacteristic>)
            .collect())
    }
}

pub struct MockCharacteristic {
    pub uuid: Uuid,
    pub value: Mutex<Vec<u8>>,
    pub reads: AtomicUsize,
    pub read_fails: AtomicBool,
    pub writes: Mutex<Vec<(Vec<u8>, WriteType)>>,
    pub write_error: Mutex<Option<Error>>,
    /// When set, writes wait for [`MockCharacteristic::release_write`].
    pub write_gated: AtomicBool,
    pub write_gate: Notify,
    pub descriptors: Vec<Arc<MockDescriptor>>,
    pub descriptor_enumerations: AtomicUsize,
    pub changes: Mutex<Option<broadcast::Sender<()>>>,
    pub notifying: AtomicBool,
}

impl MockCharacteristic {
    pub fn new(uuid: Uuid, value: &[u8]) -> Arc<Self> {
        Self::with_descriptors(uuid, value, Vec::new())
    }

    pub fn with_descriptors(
        uuid: Uuid,
        value: &[u8],
        descriptors: Vec<Arc<MockDescriptor>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            uuid,
            value: Mutex::new(value.to_vec()),
            reads: AtomicUsize::new(0),
            read_fails: AtomicBool::new(false),
            writes: Mutex::new(Vec::new()),
            write_error: Mutex::new(None),
            write_gated: AtomicBool::new(false),
            write_gate: Notify::new(),
            descriptors,
            descriptor_enumerations: AtomicUsize::new(0),
            changes: Mutex::new(None),
            notifying: AtomicBool::new(false),
        })
    }

    pub fn set_value(&self, value: &[u8]) {
        *self.value.lock().unwrap() = value.to_vec();
    }

    /// Fires a native "value changed" event.
    pub fn emit_change(&self) {
        if let Some(sender) = self.changes.lock().unwrap().as_ref() {
            sender.send(()).ok();
        }
    }

    /// Ends the native change stream, as when the device disconnects.
    pub fn end_changes(&self) {
        self.changes.lock().unwrap().take();
    }

    pub fn release_write(&self) {
        self.write_gate.notify_one();
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteCharacteristic for MockCharacteristic {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn properties(&self) -> CharPropFlags {
        CharPropFlags::READ | CharPropFlags::WRITE | CharPropFlags::NOTIFY
    }

    async fn read_value(&self) -> Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        if self.read_fails.load(Ordering::SeqCst) {
            return Err(Error::NotSupported("read".to_string()));
        }

        Ok(self.value.lock().unwrap().clone())
    }

    async fn write_value(&self, value: &[u8], write_type: WriteType) -> Result<()> {
        if self.write_gated.load(Ordering::SeqCst) {
            self.write_gate.notified().await;
        }

        if let Some(e) = self.write_error.lock().unwrap().take() {
            return Err(e);
        }

        self.writes
            .lock()
            .unwrap()
            .push((value.to_vec(), write_type));
        Ok(())
    }

    async fn descriptors(&self, uuid: Option<Uuid>) -> Result<Vec<Arc<dyn RemoteDescriptor>>> {
        self.descriptor_enumerations.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .descriptors
            .iter()
            .filter(|descriptor| uuid.map_or(true, |uuid| descriptor.uuid == uuid))
            .map(|descriptor| descriptor.clone() as Arc<dyn RemoteDescriptor>)
            .collect())
    }

    async fn start_notifications(&self) -> Result<ChangeStream> {
        self.notifying.store(true, Ordering::SeqCst);

        let receiver = self
            .changes
            .lock()
            .unwrap()
            .get_or_insert_with(|| broadcast::channel(16).0)
            .subscribe();

        Ok(Box::pin(
            BroadcastStream::new(receiver).filter_map(|x| async move { x.ok() }),
        ))
    }

    async fn stop_notifications(&self) -> Result<()> {
        self.notifying.store(false, Ordering::SeqCst);
        Ok(())
    }
}

pub struct MockDescriptor {
    pub uuid: Uuid,
    pub value: Mutex<Vec<u8>>,
}

impl MockDescriptor {
    pub fn new(uuid: Uuid, value: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            uuid,
            value: Mutex::new(value.to_vec()),
        })
    }
}

#[async_trait]
impl RemoteDescriptor for MockDescriptor {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    async fn read_value(&self) -> Result<Vec<u8>> {
        Ok(self.value.lock().unwrap().clone())
    }

    async fn write_value(&self, value: &[u8]) -> Result<()> {
        *self.value.lock().unwrap() = value.to_vec();
        Ok(())
    }
}

pub const SERVICE_A: Uuid = uuid_from_u16(0x180D);
pub const SERVICE_B: Uuid = uuid_from_u16(0x180F);
pub const CHAR_A1: Uuid = uuid_from_u16(0x2A37);
pub const CHAR_A2: Uuid = uuid_from_u16(0x2A38);
pub const CHAR_B1: Uuid = uuid_from_u16(0x2A19);
pub const USER_DESCRIPTION: Uuid = uuid_from_u16(0x2901);
pub const CCCD: Uuid = uuid_from_u16(0x2902);

/// Two services: A with two characteristics, B with one.
pub struct Fixture {
    pub a1: Arc<MockCharacteristic>,
    pub a2: Arc<MockCharacteristic>,
    pub b1: Arc<MockCharacteristic>,
    pub gatt: Arc<MockGatt>,
}

impl Fixture {
    pub fn new() -> Self {
        let a1 = MockCharacteristic::with_descriptors(
            CHAR_A1,
            &[0x06, 0x48],
            vec![
                MockDescriptor::new(USER_DESCRIPTION, b"Heart rate"),
                MockDescriptor::new(CCCD, &[0, 0]),
            ],
        );
        let a2 = MockCharacteristic::new(CHAR_A2, &[0x01]);
        let b1 = MockCharacteristic::new(CHAR_B1, &[87]);

        let gatt = MockGatt::new(vec![
            MockService::new(SERVICE_A, vec![a1.clone(), a2.clone()]),
            MockService::new(SERVICE_B, vec![b1.clone()]),
        ]);

        Self { a1, a2, b1, gatt }
    }

    pub fn bluetooth(&self) -> Bluetooth<MockHost> {
        Bluetooth::new(MockHost::new(self.gatt.clone()))
    }
}
