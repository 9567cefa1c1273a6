use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::host::RemoteService;
use crate::{Characteristic, Result};

/// A GATT service with all of its characteristics already discovered.
#[derive(Clone)]
pub struct Service {
    service: Arc<dyn RemoteService>,
    characteristics: Vec<Characteristic>,
}

impl Service {
    /// Wraps the service, discovering its characteristics.
    pub(crate) async fn discover(service: Arc<dyn RemoteService>) -> Result<Self> {
        let characteristics = service
            .characteristics(None)
            .await?
            .into_iter()
            .map(Characteristic::new)
            .collect::<Vec<_>>();

        log::trace!(
            "Service {} has {} characteristics",
            service.uuid(),
            characteristics.len()
        );

        Ok(Self {
            service,
            characteristics,
        })
    }

    pub fn uuid(&self) -> Uuid {
        self.service.uuid()
    }

    pub fn is_primary(&self) -> bool {
        self.service.is_primary()
    }

    pub fn characteristics(&self) -> &[Characteristic] {
        &self.characteristics
    }

    /// Get characteristic by UUID
    pub fn characteristic(&self, uuid: Uuid) -> Option<&Characteristic> {
        self.characteristics
            .iter()
            .find(|characteristic| characteristic.uuid() == uuid)
    }

    /// All characteristics with the given UUID
    pub fn characteristics_by_uuid(&self, uuid: Uuid) -> impl Iterator<Item = &Characteristic> {
        self.characteristics
            .iter()
            .filter(move |characteristic| characteristic.uuid() == uuid)
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("uuid", &self.uuid())
            .field("is_primary", &self.is_primary())
            .field("characteristics", &self.characteristics)
            .finish()
    }
}
