use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::host::RemoteGatt;
use crate::{Characteristic, Result, Service};

/// A connected device with its services and characteristics.
#[derive(Clone)]
pub struct Device {
    id: String,
    name: Option<String>,
    gatt: Arc<dyn RemoteGatt>,
    services: Vec<Service>,
}

impl Device {
    pub(crate) fn new(
        id: String,
        name: Option<String>,
        gatt: Arc<dyn RemoteGatt>,
        services: Vec<Service>,
    ) -> Self {
        Self {
            id,
            name,
            gatt,
            services,
        }
    }

    /// Identifier given by the host
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the device, if the host knows it
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Disconnect from the device
    #[inline]
    pub async fn disconnect(&self) -> Result<()> {
        Ok(self.gatt.disconnect().await?)
    }

    /// Services of the device, in the order the host reported them
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Get service by UUID
    pub fn service(&self, uuid: Uuid) -> Option<&Service> {
        self.services.iter().find(|service| service.uuid() == uuid)
    }

    /// The first service flagged as primary
    pub fn primary_service(&self) -> Option<&Service> {
        self.services.iter().find(|service| service.is_primary())
    }

    /// Characteristics of all services
    pub fn characteristics(&self) -> impl Iterator<Item = &Characteristic> {
        self.services
            .iter()
            .flat_map(|service| service.characteristics())
    }

    /// Get characteristic by UUID from any service
    pub fn characteristic(&self, uuid: Uuid) -> Option<&Characteristic> {
        self.characteristics()
            .find(|characteristic| characteristic.uuid() == uuid)
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("services", &self.services)
            .finish()
    }
}
