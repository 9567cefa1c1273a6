//! The Bluetooth capability this crate consumes.
//!
//! [`BtleplugHost`](crate::BtleplugHost) implements these traits on top of `btleplug`. Other
//! backends, or test doubles, can be plugged into [`Bluetooth`](crate::Bluetooth) by implementing
//! them as well.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use btleplug::api::{CharPropFlags, WriteType};
use btleplug::Result;
use futures::Stream;
use uuid::Uuid;

use crate::DeviceRequest;

/// Stream of "value changed" events of a characteristic. Items carry no payload.
pub type ChangeStream = Pin<Box<dyn Stream<Item = ()> + Send>>;

#[async_trait]
pub trait Host: Send + Sync {
    /// Whether a usable Bluetooth capability is present.
    async fn availability(&self) -> Result<bool>;

    /// Lets the host choose a device matching the request.
    async fn request_device(&self, request: &DeviceRequest) -> Result<HostDevice>;
}

/// A device chosen by the host, not yet connected.
pub struct HostDevice {
    pub id: String,
    pub name: Option<String>,
    pub gatt: Arc<dyn RemoteGatt>,
}

#[async_trait]
pub trait RemoteGatt: Send + Sync {
    async fn connect(&self) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;

    /// Primary services of the device, optionally only those with the given UUID.
    async fn primary_services(&self, uuid: Option<Uuid>) -> Result<Vec<Arc<dyn RemoteService>>>;
}

#[async_trait]
pub trait RemoteService: Send + Sync {
    fn uuid(&self) -> Uuid;

    fn is_primary(&self) -> bool;

    async fn characteristics(
        &self,
        uuid: Option<Uuid>,
    ) -> Result<Vec<Arc<dyn RemoteCharacteristic>>>;
}

#[async_trait]
pub trait RemoteCharacteristic: Send + Sync {
    fn uuid(&self) -> Uuid;

    fn properties(&self) -> CharPropFlags;

    async fn read_value(&self) -> Result<Vec<u8>>;

    async fn write_value(&self, value: &[u8], write_type: WriteType) -> Result<()>;

    async fn descriptors(&self, uuid: Option<Uuid>) -> Result<Vec<Arc<dyn RemoteDescriptor>>>;

    /// Enables value change events. The stream ends when the host stops delivering them.
    async fn start_notifications(&self) -> Result<ChangeStream>;

    async fn stop_notifications(&self) -> Result<()>;
}

#[async_trait]
pub trait RemoteDescriptor: Send + Sync {
    fn uuid(&self) -> Uuid;

    async fn read_value(&self) -> Result<Vec<u8>>;

    async fn write_value(&self, value: &[u8]) -> Result<()>;
}
