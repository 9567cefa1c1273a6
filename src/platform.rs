//! [`Host`] implementation for the platform Bluetooth adapter, via `btleplug`.

use std::sync::Arc;

use async_trait::async_trait;
use btleplug::api::{
    CharPropFlags, Characteristic as BtleCharacteristic, Descriptor as BtleDescriptor,
    Peripheral as _, Service as BtleService, WriteType,
};
use btleplug::platform::Peripheral;
use btleplug::{Error, Result};
use futures::StreamExt;
use uuid::Uuid;

use crate::host::{
    ChangeStream, Host, HostDevice, RemoteCharacteristic, RemoteDescriptor, RemoteGatt,
    RemoteService,
};
use crate::scanner::{Chooser, Session};
use crate::{DeviceRequest, ScanConfig};

/// The platform Bluetooth adapter.
///
/// Devices are chosen by scanning and taking the first device whose advertisement matches
/// the request.
#[derive(Debug, Clone, Default)]
pub struct BtleplugHost {
    config: ScanConfig,
}

impl BtleplugHost {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Host for BtleplugHost {
    async fn availability(&self) -> Result<bool> {
        Ok(Session::open(&self.config).await?.is_some())
    }

    async fn request_device(&self, request: &DeviceRequest) -> Result<HostDevice> {
        let session = Session::open(&self.config)
            .await?
            .ok_or(Error::DeviceNotFound)?;

        let peripheral = Chooser::new(&session, request)
            .choose(self.config.timeout)
            .await?;

        let name = peripheral
            .properties()
            .await?
            .and_then(|props| props.local_name);

        Ok(HostDevice {
            id: peripheral.address().to_string(),
            name,
            gatt: Arc::new(Gatt {
                _session: Arc::new(session),
                peripheral,
            }),
        })
    }
}

struct Gatt {
    _session: Arc<Session>,
    peripheral: Peripheral,
}

#[async_trait]
impl RemoteGatt for Gatt {
    async fn connect(&self) -> Result<()> {
        if !self.peripheral.is_connected().await? {
            self.peripheral.connect().await?;
        }

        if self.peripheral.services().is_empty() {
            log::debug!("Discovering services for {}", self.peripheral.address());
            self.peripheral.discover_services().await?;
        }

        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.peripheral.disconnect().await
    }

    async fn primary_services(&self, uuid: Option<Uuid>) -> Result<Vec<Arc<dyn RemoteService>>> {
        Ok(self
            .peripheral
            .services()
            .into_iter()
            .filter(|service| service.primary && uuid.map_or(true, |uuid| service.uuid == uuid))
            .map(|service| {
                Arc::new(GattService {
                    peripheral: self.peripheral.clone(),
                    service,
                }) as Arc<dyn RemoteService>
            })
            .collect())
    }
}

struct GattService {
    peripheral: Peripheral,
    service: BtleService,
}

#[async_trait]
impl RemoteService for GattService {
    fn uuid(&self) -> Uuid {
        self.service.uuid
    }

    fn is_primary(&self) -> bool {
        self.service.primary
    }

    async fn characteristics(
        &self,
        uuid: Option<Uuid>,
    ) -> Result<Vec<Arc<dyn RemoteCharacteristic>>> {
        Ok(self
            .service
            .characteristics
            .iter()
            .filter(|characteristic| uuid.map_or(true, |uuid| characteristic.uuid == uuid))
            .map(|characteristic| {
                Arc::new(GattCharacteristic {
                    peripheral: self.peripheral.clone(),
                    characteristic: characteristic.clone(),
                }) as Arc<dyn RemoteCharacteristic>
            })
            .collect())
    }
}

struct GattCharacteristic {
    peripheral: Peripheral,
    characteristic: BtleCharacteristic,
}

#[async_trait]
impl RemoteCharacteristic for GattCharacteristic {
    fn uuid(&self) -> Uuid {
        self.characteristic.uuid
    }

    fn properties(&self) -> CharPropFlags {
        self.characteristic.properties
    }

    async fn read_value(&self) -> Result<Vec<u8>> {
        self.peripheral.read(&self.characteristic).await
    }

    async fn write_value(&self, value: &[u8], write_type: WriteType) -> Result<()> {
        self.peripheral
            .write(&self.characteristic, value, write_type)
            .await
    }

    async fn descriptors(&self, uuid: Option<Uuid>) -> Result<Vec<Arc<dyn RemoteDescriptor>>> {
        Ok(self
            .characteristic
            .descriptors
            .iter()
            .filter(|descriptor| uuid.map_or(true, |uuid| descriptor.uuid == uuid))
            .map(|descriptor| {
                Arc::new(GattDescriptor {
                    peripheral: self.peripheral.clone(),
                    descriptor: descriptor.clone(),
                }) as Arc<dyn RemoteDescriptor>
            })
            .collect())
    }

    async fn start_notifications(&self) -> Result<ChangeStream> {
        self.peripheral.subscribe(&self.characteristic).await?;

        let stream = self.peripheral.notifications().await?;
        let uuid = self.characteristic.uuid;

        Ok(Box::pin(stream.filter_map(move |n| async move {
            if n.uuid == uuid {
                Some(())
            } else {
                None
            }
        })))
    }

    async fn stop_notifications(&self) -> Result<()> {
        self.peripheral.unsubscribe(&self.characteristic).await
    }
}

struct GattDescriptor {
    peripheral: Peripheral,
    descriptor: BtleDescriptor,
}

#[async_trait]
impl RemoteDescriptor for GattDescriptor {
    fn uuid(&self) -> Uuid {
        self.descriptor.uuid
    }

    async fn read_value(&self) -> Result<Vec<u8>> {
        self.peripheral.read_descriptor(&self.descriptor).await
    }

    async fn write_value(&self, value: &[u8]) -> Result<()> {
        self.peripheral
            .write_descriptor(&self.descriptor, value)
            .await
    }
}
